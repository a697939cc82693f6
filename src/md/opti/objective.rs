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

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The quantities of a trajectory which the deflection targeter may achieve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetParameter {
    /// Magnitude of the B vector in the B-Plane of the target, in km
    BMag,
    /// Distance to the target at closest approach, in km
    ClosestApproach,
}

impl TargetParameter {
    /// Default precision of an objective on this parameter
    pub fn default_precision(&self) -> f64 {
        match self {
            // The B-Plane is only a proxy of the final distance
            Self::BMag => 10.0,
            Self::ClosestApproach => 0.1,
        }
    }
}

/// Defines an objective of the targeter
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Objective {
    /// The parameter to target
    pub parameter: TargetParameter,
    /// The desired value, must be in the same units as the parameter
    pub desired_value: f64,
    /// The precision on the desired value
    pub tolerance: f64,
    /// A multiplicative factor this parameter's error in the targeting (defaults to 1.0)
    pub multiplicative_factor: f64,
    /// An additive factor to this parameters's error in the targeting (defaults to 0.0)
    pub additive_factor: f64,
}

impl Objective {
    /// Match a specific value for the parameter, with the default precision of that parameter.
    pub fn new(parameter: TargetParameter, desired_value: f64) -> Self {
        Self::within_tolerance(parameter, desired_value, parameter.default_precision())
    }

    /// Match a specific value for the parameter to hit the specified value with the provided tolerance on the value
    pub fn within_tolerance(parameter: TargetParameter, desired_value: f64, tolerance: f64) -> Self {
        Self {
            parameter,
            desired_value,
            tolerance,
            multiplicative_factor: 1.0,
            additive_factor: 0.0,
        }
    }

    /// Returns whether this objective has been achieved, and the associated parameter error.
    /// Warning: the parameter `achieved` must be in the same unit as the objective.
    pub fn assess_raw(&self, achieved: f64) -> (bool, f64) {
        let param_err =
            self.multiplicative_factor * (self.desired_value - achieved) + self.additive_factor;

        (param_err.abs() <= self.tolerance, param_err)
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "\t{:x}", self)
    }
}

impl fmt::LowerHex for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        let max_obj_tol = self.tolerance.log10().abs().ceil() as usize;

        write!(
            f,
            "{:?} → {:.prec$} ",
            self.parameter,
            self.desired_value,
            prec = max_obj_tol
        )?;

        if self.tolerance.abs() < 1e-1 {
            write!(f, "(± {:.1e})", self.tolerance)
        } else {
            write!(f, " (± {:.2})", self.tolerance)
        }
    }
}

#[cfg(test)]
mod ut_objective {
    use super::*;

    #[test]
    fn assess() {
        let obj = Objective::within_tolerance(TargetParameter::ClosestApproach, 10_000.0, 1.0);
        assert_eq!(obj.assess_raw(9_999.5), (true, 0.5));
        let (ok, err) = obj.assess_raw(9_000.0);
        assert!(!ok);
        assert_eq!(err, 1_000.0);

        let mut scaled = obj;
        scaled.multiplicative_factor = 2.0;
        scaled.additive_factor = -1.0;
        assert_eq!(scaled.assess_raw(9_999.0), (true, 1.0));

        assert_eq!(TargetParameter::BMag.default_precision(), 10.0);
    }
}
