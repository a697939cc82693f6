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

use super::{
    epoch_from_str, epoch_to_str, maybe_duration_from_str, maybe_duration_to_str,
    maybe_epoch_from_str, maybe_epoch_to_str, ConfigAstroSnafu, ConfigError, ConfigRepr,
};
use crate::cosmic::{Cosm, Frame, FrameService, Orbit, SUN_J2000};
use crate::dynamics::{build_forces, DynamicsError, ForceModelConfig};
use crate::linalg::Vector3;
use crate::md::events::StoppingSet;
use crate::md::opti::deflection::DeflectionProblem;
use crate::propagators::PropOpts;
use crate::time::{Duration, Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::sync::Arc;

/// The initial state of the analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    #[serde(default = "StateConfig::default_frame")]
    pub frame: Frame,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    /// Only used by force models which need it, none of the gravity models do
    #[serde(default)]
    pub mass_kg: f64,
}

impl StateConfig {
    fn default_frame() -> Frame {
        SUN_J2000
    }

    pub fn from_orbit(orbit: &Orbit) -> Self {
        Self {
            epoch: orbit.epoch,
            frame: orbit.frame,
            position_km: orbit.radius_km.into(),
            velocity_km_s: orbit.velocity_km_s.into(),
            mass_kg: 0.0,
        }
    }

    pub fn orbit(&self) -> Orbit {
        Orbit::new(
            Vector3::from(self.position_km),
            Vector3::from(self.velocity_km_s),
            self.epoch,
            self.frame,
        )
    }
}

/// Integrator settings, the defaults are those of [`PropOpts`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    pub init_step_s: f64,
    pub min_step_s: f64,
    pub max_step_s: f64,
    pub abs_tol: f64,
    pub rel_tol: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        let opts = PropOpts::default();
        Self {
            init_step_s: opts.init_step.to_seconds(),
            min_step_s: opts.min_step.to_seconds(),
            max_step_s: opts.max_step.to_seconds(),
            abs_tol: opts.abs_tol,
            rel_tol: opts.rel_tol,
        }
    }
}

impl IntegratorConfig {
    pub fn prop_opts(&self, accept_max_duration: bool) -> PropOpts {
        PropOpts::builder()
            .init_step(self.init_step_s * Unit::Second)
            .min_step(self.min_step_s * Unit::Second)
            .max_step(self.max_step_s * Unit::Second)
            .abs_tol(self.abs_tol)
            .rel_tol(self.rel_tol)
            .accept_max_duration(accept_max_duration)
            .build()
    }
}

/// A complete analysis: the initial state, the force model, the propagation window and what to detect and target.
///
/// Without a stopping set, the state is propagated until the end epoch. With one, it is propagated until a
/// condition stops it, or for at most the maximum duration (which may be negative to propagate backward).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub state: StateConfig,
    #[serde(default)]
    pub forces: ForceModelConfig,
    /// Defaults to the epoch of the state, which is first propagated to this epoch if they differ
    #[serde(
        default,
        serialize_with = "maybe_epoch_to_str",
        deserialize_with = "maybe_epoch_from_str"
    )]
    pub start: Option<Epoch>,
    #[serde(
        default,
        serialize_with = "maybe_epoch_to_str",
        deserialize_with = "maybe_epoch_from_str"
    )]
    pub end: Option<Epoch>,
    #[serde(
        default,
        serialize_with = "maybe_duration_to_str",
        deserialize_with = "maybe_duration_from_str"
    )]
    pub max_duration: Option<Duration>,
    /// Step of the exported ephemeris in seconds, the raw integrator states are exported if it isn't positive
    #[serde(default)]
    pub output_step_s: f64,
    #[serde(default)]
    pub integrator: IntegratorConfig,
    #[serde(default)]
    pub stopping: Option<StoppingSet>,
    #[serde(default)]
    pub targeting: Option<DeflectionProblem>,
}

impl ConfigRepr for ScenarioConfig {}

impl ScenarioConfig {
    /// A scenario propagating the state until the end epoch, with the provided force model
    pub fn new(state: Orbit, forces: ForceModelConfig, end: Epoch) -> Self {
        Self {
            state: StateConfig::from_orbit(&state),
            forces,
            start: None,
            end: Some(end),
            max_duration: None,
            output_step_s: 0.0,
            integrator: IntegratorConfig::default(),
            stopping: None,
            targeting: None,
        }
    }

    pub fn with_stopping(mut self, stopping: StoppingSet, max_duration: Duration) -> Self {
        self.stopping = Some(stopping);
        self.max_duration = Some(max_duration);
        self
    }

    pub fn with_targeting(mut self, problem: DeflectionProblem) -> Self {
        self.targeting = Some(problem);
        self
    }

    pub fn start_epoch(&self) -> Epoch {
        self.start.unwrap_or(self.state.epoch)
    }

    /// Signed duration of the propagation: until the end epoch or for the maximum duration, whichever is shorter.
    pub fn duration(&self) -> Result<Duration, ConfigError> {
        let start = self.start_epoch();
        let window = self.end.map(|end| end - start);
        let duration = match (window, self.max_duration) {
            (Some(window), Some(max)) => {
                if window.is_negative() != max.is_negative() {
                    return Err(invalid(format!(
                        "the window from {start} to the end epoch and the maximum duration of {max} have opposite directions"
                    )));
                }
                if window.abs() < max.abs() {
                    window
                } else {
                    max
                }
            }
            (Some(window), None) => {
                if self.stopping.is_some() {
                    return Err(invalid(
                        "a maximum duration is required with stopping conditions".to_string(),
                    ));
                }
                window
            }
            (None, Some(max)) => max,
            (None, None) => {
                return Err(invalid(
                    "either an end epoch or a maximum duration is required".to_string(),
                ))
            }
        };
        if duration == Duration::ZERO {
            return Err(invalid(format!("empty propagation window starting {start}")));
        }
        Ok(duration)
    }

    /// Output step, zero for the raw integrator states
    pub fn output_step(&self) -> Duration {
        if self.output_step_s > 0.0 {
            self.output_step_s * Unit::Second
        } else {
            Duration::ZERO
        }
    }

    /// Checks everything which can be checked before integrating: the state, the window, the force model against
    /// the context, the stopping set and the targeting problem.
    pub fn validate(&self, cosm: Arc<Cosm>) -> Result<(), ConfigError> {
        let state = self.state.orbit();
        if !state.is_finite() {
            return Err(invalid(format!("initial state is not finite: {state}")));
        }

        let start = self.start_epoch();
        let duration = self.duration()?;
        if duration.is_negative() && self.output_step_s > 0.0 {
            return Err(invalid(format!(
                "an output step of {} s cannot sample a backward propagation, use a step of zero to export the raw states",
                self.output_step_s
            )));
        }
        for epoch in [self.state.epoch, start, start + duration] {
            cosm.check_epoch(epoch).context(ConfigAstroSnafu)?;
        }

        build_forces(&self.forces, self.state.frame, cosm).map_err(|e| match e {
            DynamicsError::DynamicsAstro { source } => ConfigError::ConfigAstro { source },
            e => invalid(e.to_string()),
        })?;

        let integrator = self.integrator.prop_opts(false);
        integrator.validate().map_err(invalid)?;

        if let Some(stopping) = &self.stopping {
            stopping.validate().map_err(invalid)?;
        }

        if let Some(problem) = &self.targeting {
            if self.stopping.is_none() {
                return Err(invalid(
                    "targeting requires a stopping set defining the target body".to_string(),
                ));
            }
            problem.validate().map_err(invalid)?;
            if let Some(mnvr_epoch) = problem.maneuver_epoch {
                let (lower, upper) = if duration.is_negative() {
                    (start + duration, start)
                } else {
                    (start, start + duration)
                };
                if mnvr_epoch < lower || mnvr_epoch > upper {
                    return Err(invalid(format!(
                        "maneuver epoch {mnvr_epoch} is outside of the propagation window [{lower}; {upper}]"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    error!("{msg}");
    ConfigError::InvalidConfig { msg }
}
