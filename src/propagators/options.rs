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

use std::fmt;

use crate::time::{Duration, Unit};

use super::AbsRelTolerance;
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options: the initial, minimum and maximum step sizes, the
/// absolute and relative tolerances, and the policy when the maximum duration is reached.
///
/// The defaults are the reference values for small body propagation: steps between one second and one day,
/// an absolute tolerance of 1e-11 and a relative tolerance of 1e-13.
#[derive(Clone, Copy, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts {
    #[builder(default_code = "60.0 * Unit::Second")]
    pub init_step: Duration,
    #[builder(default_code = "1.0 * Unit::Second")]
    pub min_step: Duration,
    #[builder(default_code = "1.0 * Unit::Day")]
    pub max_step: Duration,
    #[builder(default = 1e-11)]
    pub abs_tol: f64,
    #[builder(default = 1e-13)]
    pub rel_tol: f64,
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default = false)]
    pub fixed_step: bool,
    /// If set, reaching the maximum duration in segmented mode is a valid end of the propagation
    #[builder(default = false)]
    pub accept_max_duration: bool,
}

impl PropOpts {
    /// `with_adaptive_step` initializes an `PropOpts` such that the integrator is used with an
    ///  adaptive step size. The number of attempts is fixed to 50 (as in GMAT).
    pub fn with_adaptive_step(
        min_step: Duration,
        max_step: Duration,
        abs_tol: f64,
        rel_tol: f64,
    ) -> Self {
        Self::builder()
            .init_step(max_step)
            .min_step(min_step)
            .max_step(max_step)
            .abs_tol(abs_tol)
            .rel_tol(rel_tol)
            .build()
    }

    pub fn with_adaptive_step_s(min_step: f64, max_step: f64, abs_tol: f64, rel_tol: f64) -> Self {
        Self::with_adaptive_step(
            min_step * Unit::Second,
            max_step * Unit::Second,
            abs_tol,
            rel_tol,
        )
    }

    /// `with_fixed_step` initializes an `PropOpts` such that the integrator is used with a fixed
    ///  step size.
    pub fn with_fixed_step(step: Duration) -> Self {
        Self::builder()
            .init_step(step)
            .min_step(step)
            .max_step(step)
            .attempts(0)
            .fixed_step(true)
            .build()
    }

    pub fn with_fixed_step_s(step: f64) -> Self {
        Self::with_fixed_step(step * Unit::Second)
    }

    /// Returns the default options with specific tolerances.
    pub fn with_tolerances(abs_tol: f64, rel_tol: f64) -> Self {
        Self::builder().abs_tol(abs_tol).rel_tol(rel_tol).build()
    }

    /// Creates options with the provided max step, and sets the initial step to that value if it's smaller.
    pub fn with_max_step(max_step: Duration) -> Self {
        let mut opts = Self::default();
        opts.set_max_step(max_step);
        opts
    }

    /// The error controller matching these tolerances
    pub fn error_ctrl(&self) -> AbsRelTolerance {
        AbsRelTolerance::new(self.abs_tol, self.rel_tol)
    }

    /// Set the maximum step size and sets the initial step to that value if currently greater
    pub fn set_max_step(&mut self, max_step: Duration) {
        if self.init_step > max_step {
            self.init_step = max_step;
        }
        self.max_step = max_step;
    }

    /// Set the minimum step size and sets the initial step to that value if currently smaller
    pub fn set_min_step(&mut self, min_step: Duration) {
        if self.init_step < min_step {
            self.init_step = min_step;
        }
        self.min_step = min_step;
    }

    /// Checks that the step bounds and tolerances can be used by an adaptive integrator.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_step <= Duration::ZERO || self.min_step > self.max_step {
            return Err(format!(
                "step bounds must satisfy 0 < min ({}) <= max ({})",
                self.min_step, self.max_step
            ));
        }
        if !self.fixed_step && (self.abs_tol <= 0.0 || self.rel_tol < 0.0) {
            return Err(format!(
                "tolerances must be positive: abs = {:e}, rel = {:e}",
                self.abs_tol, self.rel_tol
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PropOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fixed_step {
            write!(f, "fixed step: {:e}", self.min_step,)
        } else {
            write!(
                f,
                "min_step: {:e}, max_step: {:e}, abs tol: {:e}, rel tol: {:e}, attempts: {}",
                self.min_step, self.max_step, self.abs_tol, self.rel_tol, self.attempts,
            )
        }
    }
}

impl Default for PropOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[test]
fn test_options() {
    let opts = PropOpts::with_fixed_step_s(1e-1);
    assert_eq!(opts.min_step, 1e-1 * Unit::Second);
    assert_eq!(opts.max_step, 1e-1 * Unit::Second);
    assert!(opts.fixed_step);

    let opts = PropOpts::with_adaptive_step_s(1e-2, 10.0, 1e-9, 1e-12);
    assert_eq!(opts.min_step, 1e-2 * Unit::Second);
    assert_eq!(opts.max_step, 10.0 * Unit::Second);
    assert!((opts.abs_tol - 1e-9).abs() < f64::EPSILON);
    assert!(!opts.fixed_step);

    let opts = PropOpts::default();
    assert_eq!(opts.init_step, 60.0 * Unit::Second);
    assert_eq!(opts.min_step, 1.0 * Unit::Second);
    assert_eq!(opts.max_step, 86_400.0 * Unit::Second);
    assert!((opts.abs_tol - 1e-11).abs() < f64::EPSILON);
    assert!((opts.rel_tol - 1e-13).abs() < f64::EPSILON);
    assert_eq!(opts.attempts, 50);
    assert!(!opts.fixed_step);
    assert!(!opts.accept_max_duration);
    assert!(opts.validate().is_ok());

    let opts = PropOpts::with_max_step(1.0 * Unit::Second);
    assert_eq!(opts.init_step, 1.0 * Unit::Second);
    assert_eq!(opts.max_step, 1.0 * Unit::Second);

    let opts = PropOpts::builder()
        .min_step(10.0 * Unit::Second)
        .max_step(1.0 * Unit::Second)
        .build();
    assert!(opts.validate().is_err());
}
