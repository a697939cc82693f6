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
use crate::time::Epoch;
use crate::ImpactorError;
use snafu::prelude::*;

pub mod trajectory;
use trajectory::TrajError;

/// Stopping conditions, their evaluation on each accepted step, and the classification of the detections into events.
pub mod events;

/// Differential correction of maneuvers.
pub mod opti;
pub use opti::target_variable::{Variable, Vary};

/// Full analysis of a scenario: propagation, events, export and targeting.
pub mod analysis;

/// An ephemeris which can be queried at any epoch within its bounds.
///
/// Both the plain propagation result ([`trajectory::Traj`]) and the propagation with stopping conditions
/// ([`events::StoppedTraj`]) implement this interface, and the export ([`trajectory::sample`]) only relies on it.
pub trait Ephemeris {
    /// Returns the (interpolated) state at the provided epoch
    fn evaluate(&self, epoch: Epoch) -> Result<Orbit, TrajError>;

    /// The accepted integrator states, sorted by epoch
    fn states(&self) -> &[Orbit];

    fn first_epoch(&self) -> Option<Epoch> {
        self.states().first().map(|s| s.epoch)
    }

    fn last_epoch(&self) -> Option<Epoch> {
        self.states().last().map(|s| s.epoch)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TargetingError {
    /// Raised if the variables of the problem are incorrectly configured
    #[snafu(display("incorrectly configured variable: {msg}"))]
    VariableError { msg: String },
    /// The Jacobian cannot be inverted, no correction can be computed
    #[snafu(display("singular jacobian at iteration {iteration}: variables {variables:?}, residuals {residuals:?}"))]
    SingularJacobian {
        iteration: usize,
        variables: Vec<f64>,
        residuals: Vec<f64>,
    },
    /// The maximum number of iterations was reached before convergence
    #[snafu(display("not converged after {iterations} iterations: variables {variables:?}, residuals {residuals:?}"))]
    TooManyIterations {
        iterations: usize,
        variables: Vec<f64>,
        residuals: Vec<f64>,
    },
    /// The forward simulation failed
    #[snafu(display("targeting simulation failed: {source}"))]
    Simulation { source: Box<ImpactorError> },
}
