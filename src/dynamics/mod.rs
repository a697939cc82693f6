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

use crate::cosmic::{AstroError, Orbit};
use crate::io::ConfigError;
use crate::linalg::{Vector3, Vector6};
use snafu::Snafu;
use std::fmt;

/// The orbital dynamics: central body two-body term plus the acceleration models.
pub mod orbital;
pub use self::orbital::*;

/// Spherical harmonic gravity models.
pub mod sph_harmonics;
pub use self::sph_harmonics::*;

/// The force model configuration and the construction of the acceleration terms.
pub mod forces;
pub use self::forces::*;

/// A trait for models with equations of motion that can be integrated.
///
/// The state is always a position and velocity (6 components): mass is not propagated.
pub trait Dynamics: Clone + Sync + Send {
    /// Defines the equations of motion.
    ///
    /// - `delta_t_s`: Time in seconds past the context epoch.
    /// - `state_vec`: The state vector, which changes at each integration step.
    /// - `state_ctx`: The state context, used to rebuild the state from the state vector.
    fn eom(
        &self,
        delta_t_s: f64,
        state_vec: &Vector6<f64>,
        state_ctx: &Orbit,
    ) -> Result<Vector6<f64>, DynamicsError>;

    /// Performs final changes after each successful integration step.
    ///
    /// Also called before the first integration step to update the initial state if needed.
    fn finally(&self, next_state: Orbit) -> Result<Orbit, DynamicsError> {
        Ok(next_state)
    }
}

/// A trait for immutable dynamics that return an acceleration (e.g., spherical harmonics).
pub trait AccelModel: Send + Sync + fmt::Display {
    /// Defines the equations of motion for this acceleration model, in the frame of the osculating state.
    fn eom(&self, osc: &Orbit) -> Result<Vector3<f64>, DynamicsError>;
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// Astrodynamics error.
    #[snafu(display("dynamical model encountered an astro error: {source}"))]
    DynamicsAstro { source: AstroError },
    /// The force model configuration is inconsistent.
    #[snafu(display("invalid force model: {msg}"))]
    InvalidForceModel { msg: String },
    /// The gravity field could not be loaded.
    #[snafu(display("could not load the gravity field: {source}"))]
    GravityFile { source: ConfigError },
}
