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

use crate::cosmic::Orbit;
use crate::polyfit::hermite::hermite_eval;
use crate::polyfit::InterpolationError;
use crate::time::Epoch;

/// Maximum number of states used by one interpolation.
pub(crate) const INTERPOLATION_SAMPLES: usize = 8;

/// States that can be interpolated should implement this trait.
pub trait Interpolatable: Copy + Sized {
    /// Interpolates a new state at the provided epochs given a slice of states.
    fn interpolate(self, epoch: Epoch, states: &[Self]) -> Result<Self, InterpolationError>;
}

impl Interpolatable for Orbit {
    /// Hermite interpolation of the position using the velocity as derivative, done on each axis.
    ///
    /// The time is normalized to [-1; 1] over the window of samples so that the divided differences stay well conditioned
    /// over multi day steps. The offsets are computed as durations, so they are exact whatever the epoch.
    fn interpolate(self, epoch: Epoch, states: &[Self]) -> Result<Self, InterpolationError> {
        let (first, last) = match (states.first(), states.last()) {
            (Some(first), Some(last)) => (first.epoch, last.epoch),
            _ => {
                return Err(InterpolationError::InvalidInterpolationData {
                    msg: "no states to interpolate".to_string(),
                })
            }
        };

        let half_span_s = 0.5 * (last - first).to_seconds();
        if half_span_s <= 0.0 {
            // A single sample (or many at the same epoch)
            return if first == epoch {
                Ok(states[0])
            } else {
                Err(InterpolationError::InvalidInterpolationData {
                    msg: format!("cannot extrapolate a single state at {first} to {epoch}"),
                })
            };
        }
        let normalize = |e: Epoch| (e - first).to_seconds() / half_span_s - 1.0;

        // Statically allocated arrays of the maximum number of samples
        let n = states.len().min(INTERPOLATION_SAMPLES);
        let mut ts = [0.0; INTERPOLATION_SAMPLES];
        let mut pos = [[0.0; INTERPOLATION_SAMPLES]; 3];
        let mut vel = [[0.0; INTERPOLATION_SAMPLES]; 3];

        for (cno, state) in states.iter().take(n).enumerate() {
            ts[cno] = normalize(state.epoch);
            for axis in 0..3 {
                pos[axis][cno] = state.radius_km[axis];
                // d/dtau = d/dt * dt/dtau
                vel[axis][cno] = state.velocity_km_s[axis] * half_span_s;
            }
        }

        let tau = normalize(epoch);

        let mut me = self;
        for axis in 0..3 {
            let (r, dr_dtau) = hermite_eval(&ts[..n], &pos[axis][..n], &vel[axis][..n], tau)?;
            me.radius_km[axis] = r;
            me.velocity_km_s[axis] = dr_dtau / half_span_s;
        }
        me.epoch = epoch;

        Ok(me)
    }
}
