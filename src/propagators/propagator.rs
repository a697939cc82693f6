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

use super::{IntegrationDetails, PropInstance, PropOpts, RK, RKF78};
use crate::cosmic::{Cosm, Orbit};
use crate::dynamics::Dynamics;
use crate::linalg::Vector6;
use crate::time::Duration;
use std::sync::Arc;

/// A Propagator allows propagating a set of dynamics forward or backward in time.
/// It includes the options and the set of coefficients used for the monomorphic instance.
///
/// A propagator is immutable: each [`PropInstance`] it creates owns its own state and step size, so the same
/// propagator can be shared by independent propagations.
#[derive(Clone)]
pub struct Propagator<D: Dynamics> {
    pub dynamics: D, // Stores the dynamics used. *Must* use this to get the latest values
    pub opts: PropOpts, // Stores the integration options (tolerance, min/max step, init step, etc.)
    pub(crate) order: u8, // Order of the integrator
    pub(crate) stages: usize, // Number of stages, i.e. how many times the derivatives will be called
    pub(crate) a_coeffs: &'static [f64],
    pub(crate) b_coeffs: &'static [f64],
}

impl<D: Dynamics> Propagator<D> {
    /// Each propagator must be initialized with `new` which stores propagator information.
    pub fn new<T: RK>(dynamics: D, opts: PropOpts) -> Self {
        Self {
            dynamics,
            opts,
            stages: T::STAGES,
            order: T::ORDER,
            a_coeffs: T::A_COEFFS,
            b_coeffs: T::B_COEFFS,
        }
    }

    /// An RKF7(8) propagator with custom propagator options.
    pub fn rkf78(dynamics: D, opts: PropOpts) -> Self {
        Self::new::<RKF78>(dynamics, opts)
    }

    /// Default propagator is an RKF7(8) with the default PropOpts.
    #[allow(clippy::should_implement_trait)]
    pub fn default(dynamics: D) -> Self {
        Self::rkf78(dynamics, PropOpts::default())
    }

    /// Set the absolute and relative tolerances for the propagator
    pub fn set_tolerances(&mut self, abs_tol: f64, rel_tol: f64) {
        self.opts.abs_tol = abs_tol;
        self.opts.rel_tol = rel_tol;
    }

    /// Set the maximum step size for the propagator and sets the initial step to that value if currently greater
    pub fn set_max_step(&mut self, step: Duration) {
        self.opts.set_max_step(step);
    }

    pub fn set_min_step(&mut self, step: Duration) {
        self.opts.set_min_step(step);
    }

    /// Creates an instance propagating the provided state, whose ephemeris bounds are checked against the provided context.
    pub fn with(&self, state: Orbit, cosm: Arc<Cosm>) -> PropInstance<'_, D> {
        // Pre-allocate the k used in the propagator
        let k = vec![Vector6::zeros(); self.stages];
        PropInstance {
            state,
            prop: self,
            cosm,
            details: IntegrationDetails {
                step: self.opts.init_step,
                error: 0.0,
                attempts: 1,
            },
            step_size: self.opts.init_step,
            fixed_step: self.opts.fixed_step,
            k,
        }
    }
}
