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

use crate::linalg::Vector6;
use serde_derive::{Deserialize, Serialize};

/// The Error Control trait manages how a propagator computes the error in the current step.
///
/// The returned error is normalized: a step is accepted when it is less than or equal to one.
pub trait ErrorCtrl: Copy + Send + Sync {
    /// Computes the normalized error of the candidate state from the error estimate of the integrator.
    fn estimate(&self, error_est: &Vector6<f64>, candidate: &Vector6<f64>, cur_state: &Vector6<f64>)
        -> f64;
}

/// Mixed absolute and relative error control, applied per component.
///
/// Each component of the error estimate is scaled by `abs_tol + rel_tol * max(|y_i|, |y_cand_i|)`
/// and the largest scaled component is the error of the step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbsRelTolerance {
    pub abs_tol: f64,
    pub rel_tol: f64,
}

impl AbsRelTolerance {
    pub fn new(abs_tol: f64, rel_tol: f64) -> Self {
        Self { abs_tol, rel_tol }
    }
}

impl Default for AbsRelTolerance {
    fn default() -> Self {
        Self {
            abs_tol: 1e-11,
            rel_tol: 1e-13,
        }
    }
}

impl ErrorCtrl for AbsRelTolerance {
    fn estimate(
        &self,
        error_est: &Vector6<f64>,
        candidate: &Vector6<f64>,
        cur_state: &Vector6<f64>,
    ) -> f64 {
        let mut max_err = 0.0;
        for i in 0..6 {
            let scale =
                self.abs_tol + self.rel_tol * cur_state[i].abs().max(candidate[i].abs());
            let err = (error_est[i] / scale).abs();
            if err > max_err {
                max_err = err;
            }
        }
        max_err
    }
}
