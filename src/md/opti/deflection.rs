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

use super::objective::{Objective, TargetParameter};
use super::solution::TargeterSolution;
use super::Targeter;
use crate::cosmic::{BPlane, Bodies, Cosm, Frame, FrameService, Orbit, Orientation, SUN_J2000};
use crate::dynamics::Dynamics;
use crate::io::{maybe_epoch_from_str, maybe_epoch_to_str};
use crate::linalg::Vector3;
use crate::md::events::{
    Constraint, ConstraintKind, EventType, StateFunction, StopCondition, StopEngine, Trigger,
};
use crate::md::{TargetingError, Variable, Vary};
use crate::propagators::Propagator;
use crate::time::{Duration, Epoch};
use crate::ImpactorError;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Axes in which the delta-v of a maneuver is expressed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManeuverFrame {
    /// Axes of the integration frame
    Inertial,
    /// Velocity, orbit normal and co-normal of the state at the maneuver
    Vnc,
}

/// An instantaneous change of velocity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImpulsiveManeuver {
    pub epoch: Epoch,
    pub dv_km_s: Vector3<f64>,
    pub frame: ManeuverFrame,
}

impl ImpulsiveManeuver {
    /// Builds the maneuver whose components are the values of the free variables.
    ///
    /// All of the variables must be expressed in the same frame.
    pub fn from_variables(
        epoch: Epoch,
        variables: &[Variable],
        values: &[f64],
    ) -> Result<Self, TargetingError> {
        let frame = match variables.first() {
            Some(var) if var.component.is_local() => ManeuverFrame::Vnc,
            _ => ManeuverFrame::Inertial,
        };
        if variables
            .iter()
            .any(|v| v.component.is_local() != (frame == ManeuverFrame::Vnc))
        {
            return Err(TargetingError::VariableError {
                msg: "inertial and VNC components cannot be mixed in a maneuver".to_string(),
            });
        }
        let mut dv_km_s = Vector3::zeros();
        for (var, value) in variables.iter().zip(values) {
            dv_km_s[var.component.vec_index()] += value;
        }
        Ok(Self {
            epoch,
            dv_km_s,
            frame,
        })
    }

    /// Delta-v in the axes of the frame of the provided state
    pub fn dv_inertial(&self, state: &Orbit) -> Vector3<f64> {
        match self.frame {
            ManeuverFrame::Inertial => self.dv_km_s,
            ManeuverFrame::Vnc => state.dcm_from_vnc() * self.dv_km_s,
        }
    }

    /// Returns the state right after this maneuver, which must be executed at the epoch of the state.
    pub fn apply(&self, state: &Orbit) -> Result<Orbit, TargetingError> {
        if state.epoch != self.epoch {
            return Err(TargetingError::VariableError {
                msg: format!(
                    "maneuver at {} applied to a state at {}",
                    self.epoch, state.epoch
                ),
            });
        }
        Ok(state.with_dv_km_s(self.dv_inertial(state)))
    }
}

impl fmt::Display for ImpulsiveManeuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impulsive maneuver @ {}: Δv = [{:.6}, {:.6}, {:.6}] m/s ({:?}), |Δv| = {:.6} m/s",
            self.epoch,
            self.dv_km_s[0] * 1e3,
            self.dv_km_s[1] * 1e3,
            self.dv_km_s[2] * 1e3,
            self.frame,
            self.dv_km_s.norm() * 1e3
        )
    }
}

/// The targeting problem of a deflection: which distance to achieve at the encounter with the target, and how.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeflectionProblem {
    /// Desired distance from the center of the target at closest approach, in km
    pub target_distance_km: f64,
    /// Distance used to compute the B-Plane target of the first stage, defaults to the target distance
    #[serde(default)]
    pub initial_stage_distance_km: Option<f64>,
    /// Tolerance on the closest approach distance, in km
    #[serde(default = "DeflectionProblem::default_tolerance_km")]
    pub tolerance_km: f64,
    /// Only computes the nominal encounter, without targeting
    #[serde(default)]
    pub run_nominal_only: bool,
    /// Epoch of the maneuver, defaults to the initial epoch
    #[serde(
        default,
        serialize_with = "maybe_epoch_to_str",
        deserialize_with = "maybe_epoch_from_str"
    )]
    pub maneuver_epoch: Option<Epoch>,
    /// The encounter is the first minimum of the distance to the target within this radius
    #[serde(default = "DeflectionProblem::default_encounter_radius_km")]
    pub encounter_radius_km: f64,
    #[serde(default = "DeflectionProblem::default_variables")]
    pub variables: Vec<Variable>,
    #[serde(default = "DeflectionProblem::default_iterations")]
    pub max_iterations: usize,
}

impl DeflectionProblem {
    fn default_tolerance_km() -> f64 {
        1.0
    }

    fn default_encounter_radius_km() -> f64 {
        crate::cosmic::AU_KM * 0.1
    }

    fn default_variables() -> Vec<Variable> {
        vec![Vary::VelocityV.into()]
    }

    fn default_iterations() -> usize {
        25
    }

    /// Deflection along the velocity, with the default settings
    pub fn new(target_distance_km: f64) -> Self {
        Self {
            target_distance_km,
            initial_stage_distance_km: None,
            tolerance_km: Self::default_tolerance_km(),
            run_nominal_only: false,
            maneuver_epoch: None,
            encounter_radius_km: Self::default_encounter_radius_km(),
            variables: Self::default_variables(),
            max_iterations: Self::default_iterations(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.target_distance_km > 0.0) {
            return Err(format!(
                "target distance must be positive, got {} km",
                self.target_distance_km
            ));
        }
        if let Some(initial) = self.initial_stage_distance_km {
            if !(initial > 0.0) {
                return Err(format!(
                    "initial stage distance must be positive, got {initial} km"
                ));
            }
        }
        if !(self.tolerance_km > 0.0) {
            return Err(format!(
                "targeting tolerance must be positive, got {} km",
                self.tolerance_km
            ));
        }
        if !(self.encounter_radius_km > 0.0) {
            return Err(format!(
                "encounter radius must be positive, got {} km",
                self.encounter_radius_km
            ));
        }
        if self.variables.is_empty() {
            return Err("at least one maneuver component must be varied".to_string());
        }
        for var in &self.variables {
            var.valid().map_err(|e| e.to_string())?;
        }
        ImpulsiveManeuver::from_variables(Epoch::from_tdb_seconds(0.0), &self.variables, &[])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// The closest approach to the target.
#[derive(Copy, Clone, Debug)]
pub struct Encounter {
    /// State at closest approach, in the integration frame
    pub state: Orbit,
    /// State relative to the target, in its J2000 frame
    pub rel_state: Orbit,
    /// Distance from the center of the target, in km
    pub distance_km: f64,
    /// Only defined if the relative orbit is hyperbolic
    pub b_plane: Option<BPlane>,
}

impl fmt::Display for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closest approach @ {}: {:.3} km",
            self.state.epoch, self.distance_km
        )?;
        if let Some(b_plane) = &self.b_plane {
            write!(f, " (|B| = {:.3} km)", b_plane.mag())?;
        }
        Ok(())
    }
}

/// Result of a deflection: the nominal encounter and, unless only the nominal was requested, the maneuver and what it achieves.
#[derive(Clone, Debug)]
pub struct DeflectionSolution {
    pub nominal: Encounter,
    pub maneuver: Option<ImpulsiveManeuver>,
    /// Targeter solution of each stage which was run
    pub stages: Vec<TargeterSolution>,
    pub achieved: Option<Encounter>,
}

impl fmt::Display for DeflectionSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nominal {}", self.nominal)?;
        if let Some(mnvr) = &self.maneuver {
            write!(f, "\n{mnvr}")?;
        }
        if let Some(achieved) = &self.achieved {
            write!(f, "\nachieved {achieved}")?;
        }
        Ok(())
    }
}

/// Solves for the impulsive maneuver which moves the closest approach to the target to the desired distance.
///
/// The first stage targets the B-Plane magnitude matching the desired distance, which is smooth even when the nominal
/// trajectory impacts. It is evaluated when entering the sphere of influence of the target, so each of its iterations
/// stops well before the encounter. The second stage starts from the first stage solution and targets the closest approach distance itself.
pub struct DeflectionTargeter<'a, D: Dynamics> {
    pub prop: &'a Propagator<D>,
    pub cosm: Arc<Cosm>,
    pub target: Bodies,
    /// Maximum duration between the maneuver and the encounter, negative to propagate backward
    pub max_duration: Duration,
    pub problem: DeflectionProblem,
}

impl<'a, D: Dynamics> DeflectionTargeter<'a, D> {
    pub fn new(
        prop: &'a Propagator<D>,
        cosm: Arc<Cosm>,
        target: Bodies,
        max_duration: Duration,
        problem: DeflectionProblem,
    ) -> Self {
        Self {
            prop,
            cosm,
            target,
            max_duration,
            problem,
        }
    }

    fn target_frame(&self) -> Frame {
        Frame::new(self.target, Orientation::J2000)
    }

    /// Propagates the state right after the maneuver until the encounter with the target.
    ///
    /// Each call builds its own propagator instance and stopping conditions.
    pub fn encounter(&self, post_mnvr: Orbit) -> Result<Encounter, ImpactorError> {
        let closest_approach = StopCondition::minimum(StateFunction::Distance {
            target: self.target,
        })
        .with_constraint(Constraint::at_detection(ConstraintKind::WithinDistance {
            target: self.target,
            distance_km: self.problem.encounter_radius_km,
        }))
        .recording(EventType::CloseApproach)
        .stopping();

        let mut engine = StopEngine::new(vec![closest_approach], self.cosm.clone())?;
        let stopped = self
            .prop
            .with(post_mnvr, self.cosm.clone())
            .until_stopped(self.max_duration, &mut engine)?;

        let state = stopped.final_state;
        if !stopped.stopped {
            return Err(ImpactorError::PropagationFailure {
                msg: format!(
                    "no encounter with {} within {} of {}",
                    self.target, self.max_duration, post_mnvr.epoch
                ),
            });
        }
        let rel_state = self.cosm.try_frame_chg(&state, self.target_frame())?;
        Ok(Encounter {
            state,
            rel_state,
            distance_km: rel_state.rmag_km(),
            b_plane: BPlane::new(rel_state).ok(),
        })
    }

    /// Radius of the sphere of influence of the target, capped by the encounter radius.
    pub fn entry_radius_km(&self, epoch: Epoch) -> Result<f64, ImpactorError> {
        if self.target == Bodies::Sun {
            return Ok(self.problem.encounter_radius_km);
        }
        let helio = self.cosm.celestial_state(self.target, epoch, SUN_J2000)?;
        let soi_km = helio.rmag_km() * (self.target.gm() / Bodies::Sun.gm()).powf(0.4);
        Ok(soi_km.min(self.problem.encounter_radius_km))
    }

    /// B-Plane of the state entering the sphere of influence of the target, or of the state itself if it is already within.
    ///
    /// This only propagates until the entry, and is what the first stage targets.
    pub fn b_plane_at_entry(&self, post_mnvr: Orbit) -> Result<BPlane, ImpactorError> {
        let radius_km = self.entry_radius_km(post_mnvr.epoch)?;
        let rel_state = self.cosm.try_frame_chg(&post_mnvr, self.target_frame())?;
        if rel_state.rmag_km() <= radius_km {
            return Ok(BPlane::new(rel_state)?);
        }

        let entry = StopCondition::new(
            StateFunction::Distance {
                target: self.target,
            },
            radius_km,
            Trigger::ThresholdDecreasing,
        )
        .with_tolerance(1e-3)
        .stopping();

        let mut engine = StopEngine::new(vec![entry], self.cosm.clone())?;
        let stopped = self
            .prop
            .with(post_mnvr, self.cosm.clone())
            .until_stopped(self.max_duration, &mut engine)?;
        if !stopped.stopped {
            return Err(ImpactorError::PropagationFailure {
                msg: format!(
                    "never within {radius_km:.0} km of {} in {} from {}",
                    self.target, self.max_duration, post_mnvr.epoch
                ),
            });
        }
        let rel_state = self
            .cosm
            .try_frame_chg(&stopped.final_state, self.target_frame())?;
        debug!("entry @ {}: {:.3} km", rel_state.epoch, rel_state.rmag_km());
        Ok(BPlane::new(rel_state)?)
    }

    /// B-Plane magnitude of a hyperbolic encounter whose periapsis radius is `distance_km`
    fn b_mag_for_distance(&self, nominal: &Encounter, distance_km: f64) -> f64 {
        let gm = self.target.gm();
        let v_inf_sq = 2.0 * nominal.rel_state.energy_km2_s2();
        distance_km * (1.0 + 2.0 * gm / (distance_km * v_inf_sq)).sqrt()
    }

    /// Runs the nominal encounter and, unless only the nominal is requested, both targeting stages.
    pub fn solve(&self, initial_state: Orbit) -> Result<DeflectionSolution, ImpactorError> {
        self.problem
            .validate()
            .map_err(|msg| ImpactorError::InvalidConfiguration { msg })?;

        let mnvr_epoch = self.problem.maneuver_epoch.unwrap_or(initial_state.epoch);
        let xi = if mnvr_epoch == initial_state.epoch {
            initial_state
        } else {
            self.prop
                .with(initial_state, self.cosm.clone())
                .until_epoch(mnvr_epoch)?
        };

        let nominal = self.encounter(xi)?;
        info!("Nominal {nominal}");

        if self.problem.run_nominal_only {
            return Ok(DeflectionSolution {
                nominal,
                maneuver: None,
                stages: Vec::new(),
                achieved: None,
            });
        }

        let variables = &self.problem.variables;
        let mut stages = Vec::with_capacity(2);
        let mut guess: Vec<f64> = variables.iter().map(|v| v.init_guess).collect();

        // Stage one, on the B-Plane
        if nominal.b_plane.is_some() {
            let distance_km = self
                .problem
                .initial_stage_distance_km
                .unwrap_or(self.problem.target_distance_km);
            let b_mag = self.b_mag_for_distance(&nominal, distance_km);
            let objective = Objective::within_tolerance(
                TargetParameter::BMag,
                b_mag,
                self.problem
                    .tolerance_km
                    .max(TargetParameter::BMag.default_precision()),
            );
            let stage = Targeter::new(variables.clone(), vec![objective])
                .with_iterations(self.problem.max_iterations)
                .try_achieve_fd(|x| {
                    let mnvr = ImpulsiveManeuver::from_variables(mnvr_epoch, variables, x)?;
                    Ok(vec![self.b_plane_at_entry(mnvr.apply(&xi)?)?.mag()])
                })?;
            info!("B-Plane stage: {stage}");
            guess = stage.correction.clone();
            stages.push(stage);
        } else {
            warn!("nominal encounter is not hyperbolic, skipping the B-Plane stage");
        }

        // Stage two, on the closest approach, from the previous solution
        let stage_vars: Vec<Variable> = variables
            .iter()
            .zip(&guess)
            .map(|(v, g)| v.with_initial_guess(*g))
            .collect();
        let objective = Objective::within_tolerance(
            TargetParameter::ClosestApproach,
            self.problem.target_distance_km,
            self.problem.tolerance_km,
        );
        let stage = Targeter::new(stage_vars, vec![objective])
            .with_iterations(self.problem.max_iterations)
            .try_achieve_fd(|x| {
                let mnvr = ImpulsiveManeuver::from_variables(mnvr_epoch, variables, x)?;
                Ok(vec![self.encounter(mnvr.apply(&xi)?)?.distance_km])
            })?;
        info!("Closest approach stage: {stage}");

        let maneuver = ImpulsiveManeuver::from_variables(mnvr_epoch, variables, &stage.correction)?;
        let achieved = self.encounter(maneuver.apply(&xi)?)?;
        info!("{maneuver} achieves {achieved}");
        stages.push(stage);

        Ok(DeflectionSolution {
            nominal,
            maneuver: Some(maneuver),
            stages,
            achieved: Some(achieved),
        })
    }
}
