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

use super::events::{classify, EventSummary, StopEngine};
use super::opti::deflection::{DeflectionSolution, DeflectionTargeter};
use super::trajectory::{sample, Traj};
use crate::cosmic::{Cosm, Orbit};
use crate::dynamics::OrbitalDynamics;
use crate::io::scenario::ScenarioConfig;
use crate::propagators::Propagator;
use crate::time::{Duration, Epoch};
use crate::ImpactorError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Everything an analysis produces.
#[derive(Clone, Debug)]
pub struct AnalysisResult {
    /// Where the nominal propagation ended
    pub final_state: Orbit,
    /// Every accepted step of the nominal propagation
    pub traj: Traj,
    /// The nominal trajectory sampled on the output grid, or its raw steps
    pub ephemeris: Vec<Orbit>,
    /// Only set if the scenario has stopping conditions
    pub events: Option<EventSummary>,
    /// Only set if the scenario has a targeting problem
    pub deflection: Option<DeflectionSolution>,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} states until {}",
            self.traj.len(),
            self.final_state.epoch
        )?;
        if let Some(events) = &self.events {
            write!(f, "\n{events}")?;
        }
        if let Some(deflection) = &self.deflection {
            write!(f, "\n{deflection}")?;
        }
        Ok(())
    }
}

/// A validated scenario, ready to be run.
///
/// All of the checks happen when building the analysis, so that a bad input never starts an integration.
pub struct ImpactAnalysis {
    pub config: ScenarioConfig,
    pub cosm: Arc<Cosm>,
    prop: Propagator<OrbitalDynamics>,
    duration: Duration,
}

impl ImpactAnalysis {
    pub fn from_config(config: ScenarioConfig, cosm: Arc<Cosm>) -> Result<Self, ImpactorError> {
        config.validate(cosm.clone())?;
        let duration = config.duration()?;
        let dynamics =
            OrbitalDynamics::from_config(&config.forces, config.state.frame, cosm.clone())?;
        // With stopping conditions, reaching the maximum duration is a miss
        let opts = config.integrator.prop_opts(config.stopping.is_some());
        Ok(Self {
            prop: Propagator::rkf78(dynamics, opts),
            config,
            cosm,
            duration,
        })
    }

    pub fn start_epoch(&self) -> Epoch {
        self.config.start_epoch()
    }

    /// Signed duration of the nominal propagation
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The initial state, propagated to the start epoch if needed
    fn initial_state(&self) -> Result<Orbit, ImpactorError> {
        let state = self.config.state.orbit();
        let start = self.start_epoch();
        if state.epoch == start {
            Ok(state)
        } else {
            Ok(self
                .prop
                .with(state, self.cosm.clone())
                .until_epoch(start)?)
        }
    }

    /// Runs the nominal propagation, classifies its events, exports its ephemeris and solves the targeting problem.
    pub fn run(&self) -> Result<AnalysisResult, ImpactorError> {
        let start_instant = Instant::now();
        let initial = self.initial_state()?;

        let step = self.config.output_step();
        let (final_state, traj, ephemeris, events) = match &self.config.stopping {
            None => {
                let (final_state, traj) = self
                    .prop
                    .with(initial, self.cosm.clone())
                    .for_duration_with_traj(self.duration)?;
                let ephemeris = sample(&traj, initial.epoch, final_state.epoch, step)?;
                (final_state, traj, ephemeris, None)
            }
            Some(stopping) => {
                let mut engine = StopEngine::new(stopping.conditions(), self.cosm.clone())?;
                let stopped = self
                    .prop
                    .with(initial, self.cosm.clone())
                    .until_stopped(self.duration, &mut engine)?;
                let summary = classify(
                    &stopped.detections,
                    &stopped.final_state,
                    stopping.target,
                    &self.cosm,
                )?;
                info!("{summary}");
                let ephemeris = sample(&stopped, initial.epoch, stopped.final_state.epoch, step)?;
                (stopped.final_state, stopped.traj, ephemeris, Some(summary))
            }
        };

        let deflection = match (&self.config.targeting, &self.config.stopping) {
            (Some(problem), Some(stopping)) => {
                let mnvr_epoch = problem.maneuver_epoch.unwrap_or(initial.epoch);
                let targeter = DeflectionTargeter::new(
                    &self.prop,
                    self.cosm.clone(),
                    stopping.target,
                    initial.epoch + self.duration - mnvr_epoch,
                    problem.clone(),
                );
                Some(targeter.solve(initial)?)
            }
            _ => None,
        };

        let result = AnalysisResult {
            final_state,
            traj,
            ephemeris,
            events,
            deflection,
        };
        let elapsed: Duration = (Instant::now() - start_instant).into();
        info!("Analysis done in {elapsed}: {result}");
        Ok(result)
    }
}
