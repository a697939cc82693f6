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

/*! # impactor

Propagation, close-approach and impact detection, and deflection targeting for small bodies and spacecraft.

The core is made of:
+ a force model provider (point masses for the Sun, planets, Moon and named asteroids, plus spherical harmonics of the central body);
+ an adaptive Runge Kutta Fehlberg 7(8) propagator;
+ a stopping-condition engine which brackets and refines threshold crossings and extrema on every accepted step;
+ an event recorder (impact, close approach, miss);
+ a finite differencing Newton Raphson targeter;
+ an ephemeris exporter which resamples the integrator output with Hermite interpolation.

All ephemeris and gravity data is held by an immutable [`Cosm`](cosmic::Cosm) which is built once and passed to every computation.
*/

/// Provides the propagators / integrators.
pub mod propagators;

/// Provides the gravitational dynamics used for small body propagation.
pub mod dynamics;

/// Provides the solar system bodies, frames, states and the ephemeris context.
pub mod cosmic;

mod errors;
/// The library will not panic: functions which may fail return an error classified in this taxonomy.
pub use self::errors::ImpactorError;

/// Scenario configuration and gravity potential files.
pub mod io;

/// Event detection, trajectories, targeting and the analysis orchestration.
pub mod md;

/// Polynomial interpolation.
pub mod polyfit;

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{Bodies, Cosm, Frame, Orbit};
