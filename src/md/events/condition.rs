/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{EventAstroSnafu, EventError, EventType};
use crate::cosmic::{Bodies, Cosm, Frame, FrameService, Orbit, Orientation};
use crate::io::{maybe_epoch_from_str, maybe_epoch_to_str};
use crate::time::{Duration, Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;

/// A scalar function of the propagated state.
#[derive(Clone, Debug)]
pub enum StateFunction {
    /// Distance to the center of the body, in km
    Distance { target: Bodies },
    /// Distance above the equatorial radius of the body, in km
    Altitude { target: Bodies },
    /// Cartesian components in the integration frame
    X,
    Y,
    Z,
    VX,
    VY,
    VZ,
    /// Norm of the position in the integration frame
    Rmag,
    /// Norm of the velocity in the integration frame
    Vmag,
    Custom {
        name: String,
        func: fn(&Orbit) -> f64,
    },
}

impl StateFunction {
    pub fn eval(&self, state: &Orbit, cosm: &Cosm) -> Result<f64, EventError> {
        Ok(match self {
            Self::Distance { target } => target_relative(state, *target, cosm)?.rmag_km(),
            Self::Altitude { target } => target_relative(state, *target, cosm)?.altitude_km(),
            Self::X => state.radius_km[0],
            Self::Y => state.radius_km[1],
            Self::Z => state.radius_km[2],
            Self::VX => state.velocity_km_s[0],
            Self::VY => state.velocity_km_s[1],
            Self::VZ => state.velocity_km_s[2],
            Self::Rmag => state.rmag_km(),
            Self::Vmag => state.vmag_km_s(),
            Self::Custom { func, .. } => func(state),
        })
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::VX | Self::VY | Self::VZ | Self::Vmag => "km/s",
            Self::Custom { .. } => "",
            _ => "km",
        }
    }
}

impl fmt::Display for StateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance { target } => write!(f, "distance to {target}"),
            Self::Altitude { target } => write!(f, "altitude over {target}"),
            Self::Custom { name, .. } => write!(f, "{name}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// The state relative to the target body, in its inertial J2000 frame.
pub(crate) fn target_relative(state: &Orbit, target: Bodies, cosm: &Cosm) -> Result<Orbit, EventError> {
    cosm.try_frame_chg(state, Frame::new(target, Orientation::J2000))
        .context(EventAstroSnafu)
}

/// How the samples of the function trigger a detection.
///
/// The direction of a threshold crossing is defined in physical time, so a decreasing distance is a decreasing distance
/// whether the propagation is forward or backward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    ThresholdIncreasing,
    ThresholdDecreasing,
    AnyThreshold,
    LocalMinimum,
    LocalMaximum,
}

impl Trigger {
    pub fn is_threshold(&self) -> bool {
        matches!(
            self,
            Self::ThresholdIncreasing | Self::ThresholdDecreasing | Self::AnyThreshold
        )
    }
}

/// What happens once a detection passes all of its constraints.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnTrigger {
    Stop,
    #[default]
    Continue,
}

/// When a constraint is checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckMode {
    /// Once, on the refined state of the detection
    AtDetection,
    /// On every sample: the function is not sampled while the constraint fails
    Continuous,
}

#[derive(Clone, Debug)]
pub enum ConstraintKind {
    AfterEpoch(Epoch),
    BeforeEpoch(Epoch),
    WithinDistance { target: Bodies, distance_km: f64 },
    Custom {
        name: String,
        func: fn(&Orbit) -> bool,
    },
}

/// A predicate gating a stopping condition. All of the constraints of a condition must hold.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub check: CheckMode,
}

impl Constraint {
    pub fn at_detection(kind: ConstraintKind) -> Self {
        Self {
            kind,
            check: CheckMode::AtDetection,
        }
    }

    pub fn continuous(kind: ConstraintKind) -> Self {
        Self {
            kind,
            check: CheckMode::Continuous,
        }
    }

    pub fn holds(&self, state: &Orbit, cosm: &Cosm) -> Result<bool, EventError> {
        Ok(match &self.kind {
            ConstraintKind::AfterEpoch(epoch) => state.epoch >= *epoch,
            ConstraintKind::BeforeEpoch(epoch) => state.epoch <= *epoch,
            ConstraintKind::WithinDistance {
                target,
                distance_km,
            } => target_relative(state, *target, cosm)?.rmag_km() <= *distance_km,
            ConstraintKind::Custom { func, .. } => func(state),
        })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::AfterEpoch(epoch) => write!(f, "after {epoch}"),
            ConstraintKind::BeforeEpoch(epoch) => write!(f, "before {epoch}"),
            ConstraintKind::WithinDistance {
                target,
                distance_km,
            } => write!(f, "within {distance_km} km of {target}"),
            ConstraintKind::Custom { name, .. } => write!(f, "{name}"),
        }?;
        write!(f, " ({:?})", self.check)
    }
}

/// A stopping condition as data: a function of the state, how its samples trigger, the constraints gating the
/// detection and what to do once detected.
#[derive(Clone, Debug)]
pub struct StopCondition {
    pub function: StateFunction,
    /// Value of the function to cross, unused for extrema
    pub threshold: f64,
    /// Precision on the value of the function at a threshold crossing
    pub tolerance: f64,
    pub trigger: Trigger,
    pub constraints: Vec<Constraint>,
    pub on_trigger: OnTrigger,
    /// The event this condition records, if any
    pub record_as: Option<EventType>,
    /// Precision on the epoch of the detection
    pub epoch_precision: Duration,
}

impl StopCondition {
    pub fn new(function: StateFunction, threshold: f64, trigger: Trigger) -> Self {
        Self {
            function,
            threshold,
            tolerance: 1e-6,
            trigger,
            constraints: Vec::new(),
            on_trigger: OnTrigger::Continue,
            record_as: None,
            epoch_precision: 1 * Unit::Millisecond,
        }
    }

    /// Detects a local minimum of the function
    pub fn minimum(function: StateFunction) -> Self {
        Self::new(function, 0.0, Trigger::LocalMinimum)
    }

    /// Detects a local maximum of the function
    pub fn maximum(function: StateFunction) -> Self {
        Self::new(function, 0.0, Trigger::LocalMaximum)
    }

    /// An impact: the altitude over the target decreases through `altitude_km`. Stops the propagation.
    pub fn impact(target: Bodies, altitude_km: f64) -> Self {
        Self::new(
            StateFunction::Altitude { target },
            altitude_km,
            Trigger::ThresholdDecreasing,
        )
        .with_tolerance(1e-4)
        .recording(EventType::Impact)
        .stopping()
    }

    /// A close approach: a local minimum of the distance to the target within `radius_km` of it. Does not stop the propagation.
    pub fn close_approach(target: Bodies, radius_km: f64) -> Self {
        Self::minimum(StateFunction::Distance { target })
            .with_constraint(Constraint::at_detection(ConstraintKind::WithinDistance {
                target,
                distance_km: radius_km,
            }))
            .recording(EventType::CloseApproach)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_epoch_precision(mut self, precision: Duration) -> Self {
        self.epoch_precision = precision;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn stopping(mut self) -> Self {
        self.on_trigger = OnTrigger::Stop;
        self
    }

    pub fn continuing(mut self) -> Self {
        self.on_trigger = OnTrigger::Continue;
        self
    }

    pub fn recording(mut self, event_type: EventType) -> Self {
        self.record_as = Some(event_type);
        self
    }

    pub fn stops(&self) -> bool {
        self.on_trigger == OnTrigger::Stop
    }

    /// Checks the tolerances of this condition
    pub fn validate(&self) -> Result<(), EventError> {
        if !(self.tolerance > 0.0) {
            return Err(EventError::InvalidCondition {
                msg: format!("{self}: tolerance must be positive, got {}", self.tolerance),
            });
        }
        if self.epoch_precision <= Duration::ZERO {
            return Err(EventError::InvalidCondition {
                msg: format!(
                    "{self}: epoch precision must be positive, got {}",
                    self.epoch_precision
                ),
            });
        }
        if self.trigger.is_threshold() && !self.threshold.is_finite() {
            return Err(EventError::InvalidCondition {
                msg: format!("{self}: threshold must be finite"),
            });
        }
        Ok(())
    }

    /// Whether all of the constraints with the provided check mode hold
    pub(crate) fn constraints_hold(
        &self,
        state: &Orbit,
        check: CheckMode,
        cosm: &Cosm,
    ) -> Result<bool, EventError> {
        for constraint in self.constraints.iter().filter(|c| c.check == check) {
            if !constraint.holds(state, cosm)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trigger {
            Trigger::LocalMinimum => write!(f, "min of {}", self.function),
            Trigger::LocalMaximum => write!(f, "max of {}", self.function),
            trigger => write!(
                f,
                "{} = {} {} ({:?})",
                self.function,
                self.threshold,
                self.function.unit(),
                trigger
            ),
        }?;
        for constraint in &self.constraints {
            write!(f, ", {constraint}")?;
        }
        Ok(())
    }
}

/// The stopping set of an analysis, as configured by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoppingSet {
    /// The body whose close approaches and impacts are detected
    pub target: Bodies,
    /// Records the close approaches within `close_approach_radius_km` of the target
    #[serde(default)]
    pub enable_close_approach: bool,
    #[serde(default = "StoppingSet::default_close_approach_radius_km")]
    pub close_approach_radius_km: f64,
    /// Stops at the first recorded close approach
    #[serde(default)]
    pub stop_on_close_approach: bool,
    /// Close approaches before this epoch are ignored
    #[serde(
        default,
        serialize_with = "maybe_epoch_to_str",
        deserialize_with = "maybe_epoch_from_str"
    )]
    pub stop_after_epoch: Option<Epoch>,
    /// Altitude over the target below which the object impacts, if set
    #[serde(default)]
    pub impact_altitude_km: Option<f64>,
    #[serde(default = "StoppingSet::default_stop_on_impact")]
    pub stop_on_impact: bool,
}

impl StoppingSet {
    fn default_close_approach_radius_km() -> f64 {
        // One tenth of an AU
        crate::cosmic::AU_KM * 0.1
    }

    fn default_stop_on_impact() -> bool {
        true
    }

    /// Only detects impacts on the target
    pub fn impact(target: Bodies, altitude_km: f64) -> Self {
        Self {
            target,
            enable_close_approach: false,
            close_approach_radius_km: Self::default_close_approach_radius_km(),
            stop_on_close_approach: false,
            stop_after_epoch: None,
            impact_altitude_km: Some(altitude_km),
            stop_on_impact: true,
        }
    }

    pub fn with_close_approaches(mut self, radius_km: f64, stop: bool) -> Self {
        self.enable_close_approach = true;
        self.close_approach_radius_km = radius_km;
        self.stop_on_close_approach = stop;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.enable_close_approach && !(self.close_approach_radius_km > 0.0) {
            return Err(format!(
                "close approach radius must be positive, got {} km",
                self.close_approach_radius_km
            ));
        }
        if let Some(altitude_km) = self.impact_altitude_km {
            if !altitude_km.is_finite() || altitude_km < -self.target.equatorial_radius_km() {
                return Err(format!("invalid impact altitude of {altitude_km} km"));
            }
        }
        if !self.enable_close_approach && self.impact_altitude_km.is_none() {
            return Err("the stopping set detects nothing".to_string());
        }
        Ok(())
    }

    /// Builds the ordered list of conditions: the impact first, then the close approach.
    pub fn conditions(&self) -> Vec<StopCondition> {
        let mut conditions = Vec::new();
        if let Some(altitude_km) = self.impact_altitude_km {
            let mut impact = StopCondition::impact(self.target, altitude_km);
            if !self.stop_on_impact {
                impact = impact.continuing();
            }
            conditions.push(impact);
        }
        if self.enable_close_approach {
            let mut close_approach =
                StopCondition::close_approach(self.target, self.close_approach_radius_km);
            if let Some(epoch) = self.stop_after_epoch {
                close_approach = close_approach
                    .with_constraint(Constraint::at_detection(ConstraintKind::AfterEpoch(epoch)));
            }
            if self.stop_on_close_approach {
                close_approach = close_approach.stopping();
            }
            conditions.push(close_approach);
        }
        conditions
    }
}
