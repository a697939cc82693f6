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

use super::{AstroError, Bodies, Orbit};
use crate::linalg::Matrix3;
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Orientation of the axes of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Earth mean equator and equinox of J2000, aligned with the ICRF
    J2000,
    /// Ecliptic and equinox of J2000
    Eclipj2000,
    /// IAU body fixed frame of the center body, rotating
    BodyFixed,
}

/// A frame is a center body and an orientation of the axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    pub center: Bodies,
    pub orientation: Orientation,
}

impl Frame {
    pub const fn new(center: Bodies, orientation: Orientation) -> Self {
        Self {
            center,
            orientation,
        }
    }

    /// Gravitational parameter of the center body, in km^3/s^2
    pub const fn gm(&self) -> f64 {
        self.center.gm()
    }

    pub const fn equatorial_radius_km(&self) -> f64 {
        self.center.equatorial_radius_km()
    }

    pub const fn is_inertial(&self) -> bool {
        !matches!(self.orientation, Orientation::BodyFixed)
    }

    /// Same center, other orientation
    pub const fn with_orientation(self, orientation: Orientation) -> Self {
        Self::new(self.center, orientation)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.orientation {
            Orientation::J2000 => write!(f, "{} J2000", self.center),
            Orientation::Eclipj2000 => write!(f, "{} ECLIPJ2000", self.center),
            Orientation::BodyFixed => write!(f, "IAU {}", self.center),
        }
    }
}

pub const SUN_J2000: Frame = Frame::new(Bodies::Sun, Orientation::J2000);
pub const SUN_ECLIPJ2000: Frame = Frame::new(Bodies::Sun, Orientation::Eclipj2000);
pub const EARTH_J2000: Frame = Frame::new(Bodies::Earth, Orientation::J2000);
pub const IAU_EARTH: Frame = Frame::new(Bodies::Earth, Orientation::BodyFixed);
pub const MOON_J2000: Frame = Frame::new(Bodies::Moon, Orientation::J2000);

/// The reference frame service: resolves frames into origins and axes at a given epoch.
///
/// The propagation core only relies on this interface, so a higher fidelity implementation
/// (e.g. backed by SPICE kernels) can replace the analytic [`Cosm`](super::Cosm).
pub trait FrameService: Send + Sync {
    /// Inclusive span of epochs where the ephemerides are valid
    fn ephemeris_span(&self) -> (Epoch, Epoch);

    /// Returns the rotation matrix from the axes of `from` to the axes of `to` at the provided epoch.
    fn try_dcm_from_to(&self, from: &Frame, to: &Frame, epoch: Epoch)
        -> Result<Matrix3<f64>, AstroError>;

    /// Translates and rotates the provided state into the new frame.
    fn try_frame_chg(&self, state: &Orbit, new_frame: Frame) -> Result<Orbit, AstroError>;

    /// Raises `EphemerisOutOfRange` if the epoch cannot be served.
    fn check_epoch(&self, epoch: Epoch) -> Result<(), AstroError> {
        let (start, end) = self.ephemeris_span();
        if epoch < start || epoch > end {
            Err(AstroError::EphemerisOutOfRange { epoch, start, end })
        } else {
            Ok(())
        }
    }
}
