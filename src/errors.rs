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

use crate::cosmic::AstroError;
use crate::dynamics::DynamicsError;
use crate::io::ConfigError;
use crate::md::events::EventError;
use crate::md::trajectory::TrajError;
use crate::md::TargetingError;
use crate::propagators::PropagationError;
use crate::time::Epoch;
use snafu::prelude::*;

/// Errors of the library, classified by what the caller can do about them.
///
/// The module errors are converted into one of these classes, so a caller can tell a bad input
/// ([`ImpactorError::InvalidConfiguration`], [`ImpactorError::EphemerisOutOfRange`]) from a numerical failure
/// ([`ImpactorError::PropagationFailure`]) and from an infeasible target ([`ImpactorError::ConvergenceFailure`]).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ImpactorError {
    /// Malformed force model, body combination, time window or targeting problem, raised before any integration
    #[snafu(display("invalid configuration: {msg}"))]
    InvalidConfiguration { msg: String },
    #[snafu(display("{epoch} is outside of the ephemeris span [{start}; {end}]"))]
    EphemerisOutOfRange {
        epoch: Epoch,
        start: Epoch,
        end: Epoch,
    },
    /// Numerical divergence or invariant violation during stepping: no partial result is available
    #[snafu(display("propagation failed: {msg}"))]
    PropagationFailure { msg: String },
    /// The targeter exhausted its iterations, the last variables and residuals are kept for diagnosis
    #[snafu(display(
        "targeter did not converge in {iterations} iterations: variables {variables:?}, residuals {residuals:?}"
    ))]
    ConvergenceFailure {
        iterations: usize,
        variables: Vec<f64>,
        residuals: Vec<f64>,
    },
}

impl ImpactorError {
    /// Whether this error is due to the inputs rather than to the computation
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::EphemerisOutOfRange { .. }
        )
    }
}

impl From<AstroError> for ImpactorError {
    fn from(e: AstroError) -> Self {
        match e {
            AstroError::EphemerisOutOfRange { epoch, start, end } => {
                Self::EphemerisOutOfRange { epoch, start, end }
            }
            AstroError::UnknownBody { .. }
            | AstroError::NoGravityField { .. }
            | AstroError::AlmanacQuery { .. } => {
                Self::InvalidConfiguration { msg: e.to_string() }
            }
            AstroError::NotHyperbolic { .. } | AstroError::KeplerNoConvergence { .. } => {
                Self::PropagationFailure { msg: e.to_string() }
            }
        }
    }
}

impl From<DynamicsError> for ImpactorError {
    fn from(e: DynamicsError) -> Self {
        match e {
            DynamicsError::DynamicsAstro { source } => source.into(),
            DynamicsError::InvalidForceModel { .. } | DynamicsError::GravityFile { .. } => {
                Self::InvalidConfiguration { msg: e.to_string() }
            }
        }
    }
}

impl From<TrajError> for ImpactorError {
    fn from(e: TrajError) -> Self {
        match e {
            TrajError::StepDirection { .. } => Self::InvalidConfiguration { msg: e.to_string() },
            _ => Self::PropagationFailure { msg: e.to_string() },
        }
    }
}

impl From<EventError> for ImpactorError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::EventAstro { source } => source.into(),
            EventError::EventTraj { source } => source.into(),
            EventError::InvalidCondition { .. } => Self::InvalidConfiguration { msg: e.to_string() },
        }
    }
}

impl From<PropagationError> for ImpactorError {
    fn from(e: PropagationError) -> Self {
        match e {
            PropagationError::Dynamics { source } => source.into(),
            PropagationError::PropAstro { source } => source.into(),
            PropagationError::PropEvent { source } => source.into(),
            PropagationError::PropTraj { source } => source.into(),
            PropagationError::PropConfigError { .. } => {
                Self::InvalidConfiguration { msg: e.to_string() }
            }
            PropagationError::NonFiniteState { .. } | PropagationError::MaxDurationExceeded { .. } => {
                Self::PropagationFailure { msg: e.to_string() }
            }
        }
    }
}

impl From<ConfigError> for ImpactorError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ConfigAstro { source } => source.into(),
            _ => Self::InvalidConfiguration { msg: e.to_string() },
        }
    }
}

impl From<TargetingError> for ImpactorError {
    fn from(e: TargetingError) -> Self {
        match e {
            TargetingError::TooManyIterations {
                iterations,
                variables,
                residuals,
            } => Self::ConvergenceFailure {
                iterations,
                variables,
                residuals,
            },
            TargetingError::SingularJacobian {
                iteration,
                variables,
                residuals,
            } => Self::ConvergenceFailure {
                iterations: iteration,
                variables,
                residuals,
            },
            TargetingError::Simulation { source } => *source,
            TargetingError::VariableError { .. } => Self::InvalidConfiguration { msg: e.to_string() },
        }
    }
}
