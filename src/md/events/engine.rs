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

use super::{CheckMode, Detection, EventEdge, EventError, StopCondition, Trigger};
use crate::cosmic::{Cosm, Orbit};
use crate::md::trajectory::{EventEvaluator, Traj, TrajError};
use crate::md::Ephemeris;
use crate::time::{Duration, Epoch};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Number of samples kept per condition, enough to bracket an extremum
const HISTORY_LEN: usize = 3;

#[derive(Copy, Clone, Debug)]
struct Sample {
    epoch: Epoch,
    value: f64,
}

/// The function of a condition, offset by its threshold, as searched in the trajectory.
struct ConditionEvaluator<'a> {
    cond: &'a StopCondition,
    cosm: &'a Cosm,
    offset: f64,
}

impl fmt::Display for ConditionEvaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cond)
    }
}

impl EventEvaluator for ConditionEvaluator<'_> {
    type Error = EventError;

    fn eval(&self, state: &Orbit) -> Result<f64, EventError> {
        Ok(self.cond.function.eval(state, self.cosm)? - self.offset)
    }

    fn epoch_precision(&self) -> Duration {
        self.cond.epoch_precision
    }

    fn value_precision(&self) -> f64 {
        self.cond.tolerance
    }
}

/// Evaluates the stopping conditions on every accepted integration step.
///
/// The last samples of each condition bracket the threshold crossings and the extrema, which are then refined on the
/// trajectory being built: crossings with a Brent solver, extrema with a golden section search.
pub struct StopEngine {
    pub conditions: Vec<StopCondition>,
    cosm: Arc<Cosm>,
    history: Vec<VecDeque<Sample>>,
}

impl StopEngine {
    pub fn new(conditions: Vec<StopCondition>, cosm: Arc<Cosm>) -> Result<Self, EventError> {
        for cond in &conditions {
            cond.validate()?;
        }
        let history = vec![VecDeque::with_capacity(HISTORY_LEN + 1); conditions.len()];
        Ok(Self {
            conditions,
            cosm,
            history,
        })
    }

    /// Clears the samples, must be called before reusing this engine for another propagation.
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|h| h.clear());
    }

    /// Samples all of the conditions on the initial state of the propagation.
    pub fn prime(&mut self, state: &Orbit) -> Result<(), EventError> {
        self.reset();
        for idx in 0..self.conditions.len() {
            self.sample(idx, state)?;
        }
        Ok(())
    }

    /// Adds a sample of the condition, unless one of its continuous constraints fails, in which case the history is dropped.
    fn sample(&mut self, idx: usize, state: &Orbit) -> Result<bool, EventError> {
        let cond = &self.conditions[idx];
        let history = &mut self.history[idx];
        if !cond.constraints_hold(state, CheckMode::Continuous, &self.cosm)? {
            if !history.is_empty() {
                debug!("{cond}: continuous constraint failed @ {}", state.epoch);
            }
            history.clear();
            return Ok(false);
        }
        let value = cond.function.eval(state, &self.cosm)?;
        history.push_back(Sample {
            epoch: state.epoch,
            value,
        });
        if history.len() > HISTORY_LEN {
            history.pop_front();
        }
        Ok(true)
    }

    /// Evaluates all of the conditions on the newly accepted state, which must already be in the trajectory.
    ///
    /// Detections are returned in the order of the conditions. If any stopping condition triggered, the earliest one in
    /// the direction of propagation is flagged as `stopped` and the detections past it are dropped.
    pub fn evaluate(&mut self, traj: &Traj, state: &Orbit, forward: bool) -> Result<Vec<Detection>, EventError> {
        let mut found = Vec::new();
        for idx in 0..self.conditions.len() {
            if !self.sample(idx, state)? {
                continue;
            }
            let cond = &self.conditions[idx];
            let history = &self.history[idx];
            let candidate = if cond.trigger.is_threshold() {
                crossing(idx, cond, history, traj, &self.cosm)?
            } else {
                extremum(idx, cond, history, traj, &self.cosm)?
            };

            if let Some(detection) = candidate {
                if cond.constraints_hold(&detection.state, CheckMode::AtDetection, &self.cosm)? {
                    found.push(detection);
                } else {
                    debug!("{cond} discarded by its constraints @ {}", detection.state.epoch);
                }
            }
        }

        let stop_epoch = found
            .iter()
            .filter(|d| self.conditions[d.condition].stops())
            .map(|d| d.state.epoch)
            .reduce(|a, b| if forward { a.min(b) } else { a.max(b) });

        if let Some(stop_epoch) = stop_epoch {
            found.retain(|d| {
                if forward {
                    d.state.epoch <= stop_epoch
                } else {
                    d.state.epoch >= stop_epoch
                }
            });
            for detection in found.iter_mut() {
                detection.stopped =
                    self.conditions[detection.condition].stops() && detection.state.epoch == stop_epoch;
            }
        }

        for detection in &found {
            info!("{detection}");
        }

        Ok(found)
    }
}

/// Detects a crossing of the threshold between the last two samples, in the configured direction.
fn crossing(
    idx: usize,
    cond: &StopCondition,
    history: &VecDeque<Sample>,
    traj: &Traj,
    cosm: &Cosm,
) -> Result<Option<Detection>, EventError> {
    let n = history.len();
    if n < 2 {
        return Ok(None);
    }
    let (a, b) = (history[n - 2], history[n - 1]);
    // Direction is in physical time, not in propagation order
    let (early, late) = if a.epoch <= b.epoch { (a, b) } else { (b, a) };
    let g_early = early.value - cond.threshold;
    let g_late = late.value - cond.threshold;

    // A sample exactly on the threshold only counts as the end of a crossing, so it's detected once
    let crossed = (g_early < 0.0 && g_late >= 0.0) || (g_early > 0.0 && g_late <= 0.0);
    if !crossed {
        return Ok(None);
    }
    let edge = EventEdge::from_values(g_early, g_late);

    let wanted = match cond.trigger {
        Trigger::ThresholdIncreasing => edge == EventEdge::Rising,
        Trigger::ThresholdDecreasing => edge == EventEdge::Falling,
        _ => true,
    };
    if !wanted {
        return Ok(None);
    }

    let evaluator = ConditionEvaluator {
        cond,
        cosm,
        offset: cond.threshold,
    };
    let (state, g) = traj.find_bracketed(early.epoch, late.epoch, &evaluator)?;

    Ok(Some(Detection {
        condition: idx,
        state,
        value: g + cond.threshold,
        edge,
        event_type: cond.record_as,
        stopped: false,
        repr: format!("{cond}"),
    }))
}

/// Detects an extremum bracketed by the last three samples.
fn extremum(
    idx: usize,
    cond: &StopCondition,
    history: &VecDeque<Sample>,
    traj: &Traj,
    cosm: &Cosm,
) -> Result<Option<Detection>, EventError> {
    if history.len() < HISTORY_LEN {
        return Ok(None);
    }
    let (s0, s1, s2) = (history[0], history[1], history[2]);
    let minimum = match cond.trigger {
        Trigger::LocalMinimum if s1.value < s0.value && s1.value <= s2.value => true,
        Trigger::LocalMaximum if s1.value > s0.value && s1.value >= s2.value => false,
        _ => return Ok(None),
    };

    let (start, end) = if s0.epoch <= s2.epoch {
        (s0.epoch, s2.epoch)
    } else {
        (s2.epoch, s0.epoch)
    };

    let evaluator = ConditionEvaluator {
        cond,
        cosm,
        offset: 0.0,
    };
    let (state, value) = traj.find_minmax_bracketed(start, end, &evaluator, minimum)?;

    Ok(Some(Detection {
        condition: idx,
        state,
        value,
        edge: if minimum {
            EventEdge::Rising
        } else {
            EventEdge::Falling
        },
        event_type: cond.record_as,
        stopped: false,
        repr: format!("{cond}"),
    }))
}

/// A trajectory propagated with stopping conditions, and the detections of those conditions.
#[derive(Clone, Debug)]
pub struct StoppedTraj {
    pub traj: Traj,
    /// All of the detections, in the order they were found
    pub detections: Vec<Detection>,
    /// The state where the propagation ended: the refined stopping state or the state at the maximum duration
    pub final_state: Orbit,
    /// Set if a stopping condition ended the propagation
    pub stopped: bool,
}

impl StoppedTraj {
    /// Returns the detection which stopped the propagation
    pub fn stopped_by(&self) -> Option<&Detection> {
        self.detections.iter().find(|d| d.stopped)
    }
}

impl Ephemeris for StoppedTraj {
    fn evaluate(&self, epoch: Epoch) -> Result<Orbit, TrajError> {
        self.traj.at(epoch)
    }

    fn states(&self) -> &[Orbit] {
        &self.traj.states
    }
}
