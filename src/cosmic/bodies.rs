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

use super::AstroError;
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// The major bodies of the solar system whose gravity may be modeled.
///
/// The outer planets are their system barycenters, which is what their point mass gravity represents.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Bodies {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Bodies {
    /// Gravitational parameter in km^3/s^2 (DE440 values)
    pub const fn gm(&self) -> f64 {
        match *self {
            Self::Sun => 132_712_440_041.939_38,
            Self::Mercury => 22_031.868_551,
            Self::Venus => 324_858.592,
            Self::Earth => 398_600.435_436,
            Self::Moon => 4_902.800_066,
            Self::Mars => 42_828.375_214,
            Self::Jupiter => 126_712_764.1,
            Self::Saturn => 37_940_584.841_8,
            Self::Uranus => 5_794_556.4,
            Self::Neptune => 6_836_527.100_58,
            Self::Pluto => 975.5,
        }
    }

    /// Mean equatorial radius in km
    pub const fn equatorial_radius_km(&self) -> f64 {
        match *self {
            Self::Sun => 695_700.0,
            Self::Mercury => 2_440.53,
            Self::Venus => 6_051.8,
            Self::Earth => 6_378.136_3,
            Self::Moon => 1_737.4,
            Self::Mars => 3_396.19,
            Self::Jupiter => 71_492.0,
            Self::Saturn => 60_268.0,
            Self::Uranus => 25_559.0,
            Self::Neptune => 24_764.0,
            Self::Pluto => 1_188.3,
        }
    }

    /// IAU pole right ascension and declination (degrees), prime meridian at J2000 (degrees) and its rate (degrees per day).
    /// Secular pole motion is neglected.
    pub(crate) const fn iau_rotation(&self) -> (f64, f64, f64, f64) {
        match *self {
            Self::Sun => (286.13, 63.87, 84.176, 14.184_400_0),
            Self::Mercury => (281.0103, 61.4155, 329.5988, 6.138_510_8),
            Self::Venus => (272.76, 67.16, 160.20, -1.481_368_8),
            Self::Earth => (0.0, 90.0, 190.147, 360.985_623_5),
            Self::Moon => (269.9949, 66.5392, 38.3213, 13.176_358_15),
            Self::Mars => (317.269_202, 54.432_516, 176.049_863, 350.891_982_443_297),
            Self::Jupiter => (268.056_595, 64.495_303, 284.95, 870.536_000_0),
            Self::Saturn => (40.589, 83.537, 38.90, 810.793_902_4),
            Self::Uranus => (257.311, -15.175, 203.81, -501.160_092_8),
            Self::Neptune => (299.36, 43.46, 249.978, 541.139_775_7),
            Self::Pluto => (132.993, -6.163, 302.695, 56.362_522_5),
        }
    }

    /// NAIF identifier of the body in the JPL ephemerides, the system barycenter for the outer planets
    pub const fn naif_id(&self) -> i32 {
        match *self {
            Self::Sun => 10,
            Self::Mercury => 199,
            Self::Venus => 299,
            Self::Earth => 399,
            Self::Moon => 301,
            Self::Mars => 4,
            Self::Jupiter => 5,
            Self::Saturn => 6,
            Self::Uranus => 7,
            Self::Neptune => 8,
            Self::Pluto => 9,
        }
    }

    /// Returns the human name
    pub const fn name(&self) -> &'static str {
        match *self {
            Self::Sun => "Sun",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Earth => "Earth",
            Self::Moon => "Moon",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Pluto => "Pluto",
        }
    }

    /// The Sun and the nine planets are the only bodies with a heliocentric Keplerian ephemeris.
    pub const fn is_planet(&self) -> bool {
        !matches!(self, Self::Sun | Self::Moon)
    }
}

impl fmt::Display for Bodies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Bodies {
    type Err = AstroError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "sun" => Ok(Self::Sun),
            "mercury" => Ok(Self::Mercury),
            "venus" => Ok(Self::Venus),
            "earth" => Ok(Self::Earth),
            "moon" | "luna" => Ok(Self::Moon),
            "mars" | "mars barycenter" => Ok(Self::Mars),
            "jupiter" | "jupiter barycenter" => Ok(Self::Jupiter),
            "saturn" | "saturn barycenter" => Ok(Self::Saturn),
            "uranus" | "uranus barycenter" => Ok(Self::Uranus),
            "neptune" | "neptune barycenter" => Ok(Self::Neptune),
            "pluto" | "pluto barycenter" => Ok(Self::Pluto),
            _ => Err(AstroError::UnknownBody {
                name: name.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Bodies {
    type Error = AstroError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_str(&name)
    }
}

impl From<Bodies> for String {
    fn from(body: Bodies) -> Self {
        body.name().to_string()
    }
}
