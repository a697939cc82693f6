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

use crate::time::Epoch;
use snafu::Snafu;

mod bodies;
pub use self::bodies::*;

mod frames;
pub use self::frames::*;

mod orbit;
pub use self::orbit::*;

// Re-Export B Plane
mod bplane;
pub use self::bplane::*;

mod rotations;
pub use self::rotations::*;

mod cosm;
pub use self::cosm::*;

/// Conics of the named asteroids, and the analytic planetary model used as a test fixture.
pub mod ephemerides;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    #[snafu(display("{epoch} is outside of the ephemeris span [{start}; {end}]"))]
    EphemerisOutOfRange {
        epoch: Epoch,
        start: Epoch,
        end: Epoch,
    },
    #[snafu(display("unknown body or asteroid `{name}`"))]
    UnknownBody { name: String },
    #[snafu(display("orbit is not hyperbolic (e = {ecc}), convert to the target body first"))]
    NotHyperbolic { ecc: f64 },
    #[snafu(display("no gravity field loaded for {body}"))]
    NoGravityField { body: Bodies },
    #[snafu(display("Kepler equation did not converge for e = {ecc}"))]
    KeplerNoConvergence { ecc: f64 },
    #[snafu(display("ephemeris almanac failed when {action}: {msg}"))]
    AlmanacQuery { action: &'static str, msg: String },
}

/// Astronomical unit, in kilometers, according to the [IAU](https://www.iau.org/public/themes/measuring/).
pub const AU_KM: f64 = 149_597_870.700;

pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;
pub(crate) const DAYS_PER_CENTURY: f64 = 36_525.0;
