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

use snafu::prelude::*;
use std::fmt;

pub mod error_ctrl;
pub use self::error_ctrl::*;

mod instance;
pub use instance::*;
mod propagator;
pub use propagator::*;
mod rk_methods;
pub use rk_methods::*;
mod options;
pub use options::*;

use crate::cosmic::AstroError;
use crate::dynamics::DynamicsError;
use crate::md::events::EventError;
use crate::md::trajectory::TrajError;
use crate::time::{Duration, Epoch};

#[derive(Copy, Clone, Debug)]
pub struct IntegrationDetails {
    /// step size used
    pub step: Duration,
    /// error in the previous integration step, normalized by the tolerances
    pub error: f64,
    /// number of attempts needed by an adaptive step size to be within the tolerance
    pub attempts: u8,
}

impl fmt::Display for IntegrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntegrationDetails {{step: {}, error: {:.3e}, attempts: {}}}",
            self.step, self.error, self.attempts
        )
    }
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("propagation cannot start: {source}"))]
    PropAstro { source: AstroError },
    #[snafu(display("integration diverged: non finite state at {epoch}"))]
    NonFiniteState { epoch: Epoch },
    #[snafu(display(
        "maximum duration of {max_duration} reached at {epoch} before any stopping condition"
    ))]
    MaxDurationExceeded { max_duration: Duration, epoch: Epoch },
    #[snafu(display("invalid propagation setup: {msg}"))]
    PropConfigError { msg: String },
    #[snafu(display("when building the trajectory: {source}"))]
    PropTraj { source: TrajError },
    #[snafu(display("when evaluating the stopping conditions: {source}"))]
    PropEvent { source: EventError },
}
