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

use super::TrajError;
use crate::cosmic::Orbit;
use crate::md::Ephemeris;
use crate::time::{Duration, Epoch};

/// Samples the ephemeris between `start` and `stop`.
///
/// - If `step` is strictly positive, the states are interpolated every `step` from `start` to `stop`, and `stop` is
///   always the last sample even when it is not on the grid. A positive step requires `stop` to be after `start`.
/// - Otherwise, the raw integrator states between both epochs are returned from `start` to `stop` (in either order),
///   and if the last two states share the same epoch, only the first is kept.
pub fn sample<E: Ephemeris>(
    ephem: &E,
    start: Epoch,
    stop: Epoch,
    step: Duration,
) -> Result<Vec<Orbit>, TrajError> {
    for epoch in [start, stop] {
        match (ephem.first_epoch(), ephem.last_epoch()) {
            (Some(first), Some(last)) if first <= epoch && epoch <= last => {}
            _ => return Err(TrajError::NoInterpolationData { epoch }),
        }
    }

    let forward = stop >= start;

    if step <= Duration::ZERO {
        let (lower, upper) = if forward { (start, stop) } else { (stop, start) };
        let mut states: Vec<Orbit> = ephem
            .states()
            .iter()
            .filter(|s| s.epoch >= lower && s.epoch <= upper)
            .copied()
            .collect();
        if !forward {
            states.reverse();
        }
        dedup_last(&mut states);
        debug!("exporting {} raw states from {start} to {stop}", states.len());
        return Ok(states);
    }

    if !forward {
        error!("sampling step of {step} from {start} back to {stop}");
        return Err(TrajError::StepDirection { step, start, stop });
    }

    let mut states = Vec::new();
    let mut epoch = start;
    while epoch < stop {
        states.push(ephem.evaluate(epoch)?);
        epoch += step;
    }
    states.push(ephem.evaluate(stop)?);
    debug!(
        "exporting {} states every {step} from {start} to {stop}",
        states.len()
    );
    Ok(states)
}

/// The final callback of the integrator may emit the last state twice: keep one copy.
fn dedup_last(states: &mut Vec<Orbit>) {
    let n = states.len();
    if n >= 2 && states[n - 1].epoch == states[n - 2].epoch {
        states.pop();
    }
}
