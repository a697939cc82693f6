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

use super::{Interpolatable, InterpolationSnafu, TrajError, INTERPOLATION_SAMPLES};
use crate::cosmic::Orbit;
use crate::md::Ephemeris;
use crate::time::{Duration, Epoch, TimeSeries};
use snafu::ResultExt;
use std::fmt;

/// Store a trajectory of orbits, ordered by epoch regardless of the direction of propagation.
#[derive(Clone, Default, PartialEq)]
pub struct Traj {
    /// Optionally name this trajectory
    pub name: Option<String>,
    /// Sorted by epoch, without duplicates once finalized.
    pub states: Vec<Orbit>,
}

impl Traj {
    pub fn new() -> Self {
        Self {
            name: None,
            states: Vec::new(),
        }
    }

    /// Builds a trajectory from states in any order.
    pub fn from_states(states: Vec<Orbit>) -> Result<Self, TrajError> {
        if let Some(first) = states.first() {
            if let Some(other) = states.iter().find(|s| s.frame != first.frame) {
                return Err(TrajError::CreationError {
                    msg: format!("states in {} and {} cannot be mixed", first.frame, other.frame),
                });
            }
        }
        let mut me = Self {
            name: None,
            states,
        };
        me.finalize();
        Ok(me)
    }

    /// Orders the states, can be used to store the states out of order
    pub fn finalize(&mut self) {
        // Sort first so that duplicates are neighbors
        self.states.sort_by_key(|a| a.epoch);
        // Remove duplicate epochs, keeping the first one
        self.states.dedup_by(|a, b| a.epoch.eq(&b.epoch));
    }

    /// Adds a state while keeping the order: appended when propagating forward, prepended when propagating backward.
    ///
    /// A state at an epoch already in the trajectory is ignored.
    pub fn push(&mut self, state: Orbit) {
        match self
            .states
            .binary_search_by(|s| s.epoch.cmp(&state.epoch))
        {
            Ok(_) => debug!("ignoring duplicate state at {}", state.epoch),
            Err(idx) => self.states.insert(idx, state),
        }
    }

    /// Removes all of the states strictly after (if `forward`) or strictly before the provided epoch.
    pub fn truncate(&mut self, epoch: Epoch, forward: bool) {
        if forward {
            self.states.retain(|s| s.epoch <= epoch);
        } else {
            self.states.retain(|s| s.epoch >= epoch);
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Evaluate the trajectory at this specific epoch.
    pub fn at(&self, epoch: Epoch) -> Result<Orbit, TrajError> {
        let (first, last) = match (self.first(), self.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(TrajError::NoInterpolationData { epoch }),
        };
        if first.epoch > epoch || last.epoch < epoch {
            return Err(TrajError::NoInterpolationData { epoch });
        }
        match self
            .states
            .binary_search_by(|state| state.epoch.cmp(&epoch))
        {
            Ok(idx) => {
                // Oh wow, we actually had this exact state!
                Ok(self.states[idx])
            }
            Err(idx) => {
                if idx == 0 || idx >= self.states.len() {
                    // The binary search returns where we should insert the data, so if it's at either end of the list, then we're out of bounds.
                    // This condition should have been handled by the check at the start of this function.
                    return Err(TrajError::NoInterpolationData { epoch });
                }
                let (first_idx, last_idx) = self.interpolation_window(idx);
                self.states[idx]
                    .interpolate(epoch, &self.states[first_idx..=last_idx])
                    .context(InterpolationSnafu)
            }
        }
    }

    /// Bounds (inclusive) of the states used to interpolate within the step ending at `idx`.
    ///
    /// The window starts from the two states of that step and grows on alternating sides, up to
    /// [`INTERPOLATION_SAMPLES`] states, for as long as each added step is within a factor two of the bracketing step.
    /// When neither neighboring step qualifies, the interpolation is a cubic Hermite over the bracketing step alone.
    fn interpolation_window(&self, idx: usize) -> (usize, usize) {
        let step_s = |i: usize| (self.states[i].epoch - self.states[i - 1].epoch).to_seconds();
        let bracket_s = step_s(idx);
        let similar = |h: f64| h >= 0.5 * bracket_s && h <= 2.0 * bracket_s;

        let (mut lo, mut hi) = (idx - 1, idx);
        let mut left_turn = true;
        while hi - lo + 1 < INTERPOLATION_SAMPLES {
            let can_left = lo > 0 && similar(step_s(lo));
            let can_right = hi + 1 < self.states.len() && similar(step_s(hi + 1));
            if can_left && (left_turn || !can_right) {
                lo -= 1;
            } else if can_right {
                hi += 1;
            } else {
                break;
            }
            left_turn = !left_turn;
        }
        (lo, hi)
    }

    /// Returns the first state in this ephemeris
    pub fn first(&self) -> Option<&Orbit> {
        self.states.first()
    }

    /// Returns the last state in this ephemeris
    pub fn last(&self) -> Option<&Orbit> {
        self.states.last()
    }

    /// Creates an iterator through the trajectory by the provided step size
    pub fn every(&self, step: Duration) -> TrajIterator {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => self.every_between(step, first.epoch, last.epoch),
            _ => TrajIterator {
                time_series: None,
                traj: self,
            },
        }
    }

    /// Creates an iterator through the trajectory by the provided step size between the provided bounds
    pub fn every_between(&self, step: Duration, start: Epoch, end: Epoch) -> TrajIterator {
        TrajIterator {
            time_series: Some(TimeSeries::inclusive(start, end, step)),
            traj: self,
        }
    }
}

impl Ephemeris for Traj {
    fn evaluate(&self, epoch: Epoch) -> Result<Orbit, TrajError> {
        self.at(epoch)
    }

    fn states(&self) -> &[Orbit] {
        &self.states
    }
}

impl fmt::Display for Traj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Trajectory {}in {} from {} to {} ({}, or {:.3} s) [{} states]",
                match &self.name {
                    Some(name) => format!("of {name} "),
                    None => String::new(),
                },
                first.frame,
                first.epoch,
                last.epoch,
                last.epoch - first.epoch,
                (last.epoch - first.epoch).to_seconds(),
                self.states.len()
            ),
            _ => write!(f, "Empty trajectory"),
        }
    }
}

impl fmt::Debug for Traj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

pub struct TrajIterator<'a> {
    pub time_series: Option<TimeSeries>,
    /// The trajectory being iterated over.
    pub traj: &'a Traj,
}

impl Iterator for TrajIterator<'_> {
    type Item = Orbit;

    fn next(&mut self) -> Option<Self::Item> {
        let next_epoch = self.time_series.as_mut()?.next()?;
        match self.traj.at(next_epoch) {
            Ok(item) => Some(item),
            Err(e) => {
                error!("TrajIterator: {e} but should be present in {}", self.traj);
                None
            }
        }
    }
}

#[cfg(test)]
mod ut_traj {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use crate::time::{TimeUnits, Unit};
    use approx::assert_abs_diff_eq;

    /// Circular two body orbit sampled analytically
    fn circular(epoch: Epoch, t0: Epoch) -> Orbit {
        let r = 7_000.0_f64;
        let n = (EARTH_J2000.gm() / r.powi(3)).sqrt();
        let theta = n * (epoch - t0).to_seconds();
        Orbit::cartesian(
            r * theta.cos(),
            r * theta.sin(),
            0.0,
            -r * n * theta.sin(),
            r * n * theta.cos(),
            0.0,
            epoch,
            EARTH_J2000,
        )
    }

    #[test]
    fn hermite_on_circular_orbit() {
        let t0 = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
        let states: Vec<Orbit> = TimeSeries::inclusive(t0, t0 + 2.hours(), 5.minutes())
            .map(|e| circular(e, t0))
            .collect();
        // Reversed on purpose
        let traj = Traj::from_states(states.into_iter().rev().collect()).unwrap();
        assert_eq!(traj.len(), 25);
        assert_eq!(traj.first().unwrap().epoch, t0);

        for offset_s in [30.0, 451.2, 3_333.3, 7_170.0] {
            let epoch = t0 + offset_s * Unit::Second;
            let interp = traj.at(epoch).unwrap();
            let truth = circular(epoch, t0);
            assert_abs_diff_eq!(interp.distance_to(&truth), 0.0, epsilon = 1e-6);
            assert_abs_diff_eq!(
                (interp.velocity_km_s - truth.velocity_km_s).norm(),
                0.0,
                epsilon = 1e-9
            );
        }

        assert!(traj.at(t0 - 1.seconds()).is_err());
        assert!(traj.at(t0 + 3.hours()).is_err());
        assert_eq!(traj.every(10.minutes()).count(), 13);
    }

    #[test]
    fn push_and_truncate() {
        let t0 = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
        let mut traj = Traj::new();
        assert!(traj.first().is_none());
        // Backward propagation
        for i in 0..5_i64 {
            traj.push(circular(t0 - (i * 60).seconds(), t0));
        }
        traj.push(circular(t0 - 120.seconds(), t0));
        assert_eq!(traj.len(), 5);
        assert_eq!(traj.last().unwrap().epoch, t0);
        traj.truncate(t0 - 150.seconds(), false);
        assert_eq!(traj.len(), 3);
        traj.truncate(t0 - 90.seconds(), true);
        assert_eq!(traj.len(), 1);
    }
}
