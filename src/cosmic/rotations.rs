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

use super::{Bodies, SECONDS_PER_DAY};
use crate::linalg::{Matrix3, Vector3};
use crate::time::Epoch;

/// Obliquity of the ecliptic at J2000 (IAU 1976), in degrees
pub const OBLIQUITY_J2000_DEG: f64 = 23.439_291_111;

/// Rotation about the X axis (passive), angle in radians
pub fn r1(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Rotation about the Y axis (passive), angle in radians
pub fn r2(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

/// Rotation about the Z axis (passive), angle in radians
pub fn r3(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Defines an Euler rotation, angle must be in radians
#[derive(Clone, Copy, Debug)]
pub enum EulerRotation {
    R1(f64),
    R2(f64),
    R3(f64),
}

impl EulerRotation {
    /// Get the DCM from this Euler rotation
    pub fn dcm(&self) -> Matrix3<f64> {
        match *self {
            Self::R1(angle) => r1(angle),
            Self::R2(angle) => r2(angle),
            Self::R3(angle) => r3(angle),
        }
    }
}

/// DCM from the Earth mean equator (J2000) to the ecliptic of J2000.
pub fn dcm_j2000_to_eclipj2000() -> Matrix3<f64> {
    EulerRotation::R1(OBLIQUITY_J2000_DEG.to_radians()).dcm()
}

/// Body fixed rotation of a body, from the IAU pole and prime meridian.
#[derive(Copy, Clone, Debug)]
pub struct IauRotation {
    pub pole_ra_deg: f64,
    pub pole_dec_deg: f64,
    pub w0_deg: f64,
    pub w_rate_deg_day: f64,
}

impl IauRotation {
    pub const fn of(body: Bodies) -> Self {
        let (pole_ra_deg, pole_dec_deg, w0_deg, w_rate_deg_day) = body.iau_rotation();
        Self {
            pole_ra_deg,
            pole_dec_deg,
            w0_deg,
            w_rate_deg_day,
        }
    }

    /// Prime meridian angle in radians
    pub fn w_rad(&self, epoch: Epoch) -> f64 {
        let days = epoch.to_tdb_seconds() / SECONDS_PER_DAY;
        (self.w0_deg + self.w_rate_deg_day * days)
            .rem_euclid(360.0)
            .to_radians()
    }

    /// DCM from the J2000 equator to the body fixed frame: R3(W) R1(90 - dec) R3(90 + ra)
    pub fn dcm_from_j2000(&self, epoch: Epoch) -> Matrix3<f64> {
        let first = EulerRotation::R3((90.0 + self.pole_ra_deg).to_radians());
        let second = EulerRotation::R1((90.0 - self.pole_dec_deg).to_radians());
        let third = EulerRotation::R3(self.w_rad(epoch));
        third.dcm() * second.dcm() * first.dcm()
    }

    /// Angular velocity of the body fixed frame, expressed in J2000, in rad/s
    pub fn angular_velocity_j2000(&self) -> Vector3<f64> {
        let (ra, dec) = (self.pole_ra_deg.to_radians(), self.pole_dec_deg.to_radians());
        let pole = Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin());
        pole * self.w_rate_deg_day.to_radians() / SECONDS_PER_DAY
    }
}

#[cfg(test)]
mod ut_rotations {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn passive_rotations() {
        let x = Vector3::x();
        // Rotating the axes by +90 deg about Z moves the X vector to -Y
        let rotated = r3(std::f64::consts::FRAC_PI_2) * x;
        assert_abs_diff_eq!(rotated, -Vector3::y(), epsilon = 1e-15);
        for dcm in [r1(0.3), r2(-1.2), r3(2.5)] {
            assert_abs_diff_eq!(dcm * dcm.transpose(), Matrix3::identity(), epsilon = 1e-14);
        }
    }

    #[test]
    fn earth_pole_is_z() {
        let epoch = Epoch::from_tdb_seconds(3600.0);
        let dcm = IauRotation::of(Bodies::Earth).dcm_from_j2000(epoch);
        assert_abs_diff_eq!(dcm * Vector3::z(), Vector3::z(), epsilon = 1e-12);
        let omega = IauRotation::of(Bodies::Earth).angular_velocity_j2000();
        assert_abs_diff_eq!(omega[2], 7.292_115e-5, epsilon = 1e-10);
    }
}
