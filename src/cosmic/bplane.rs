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

use super::{AstroError, Frame, Orbit};
use crate::linalg::{Matrix3, Vector3};
use crate::time::{Duration, Epoch, Unit};
use std::fmt;

/// Stores a B-Plane
#[derive(Copy, Clone, Debug)]
pub struct BPlane {
    /// The $B_T$ component, in kilometers
    pub b_t: f64,
    /// The $B_R$ component, in kilometers
    pub b_r: f64,
    /// The Linearized Time of Flight
    pub ltof_s: f64,
    /// The B-Plane rotation matrix
    pub str_dcm: Matrix3<f64>,
    /// The frame in which this B Plane was computed
    pub frame: Frame,
    /// The time of computation
    pub epoch: Epoch,
}

impl BPlane {
    /// Returns a newly defined B-Plane if the orbit is hyperbolic about the center of its frame.
    pub fn new(orbit: Orbit) -> Result<Self, AstroError> {
        let ecc = orbit.ecc();
        if ecc <= 1.0 {
            return Err(AstroError::NotHyperbolic { ecc });
        }

        let e_hat = orbit.evec() / ecc;
        let h_hat = orbit.hvec() / orbit.hmag();
        let n_hat = h_hat.cross(&e_hat);

        let incoming_asymptote_fact = (1.0 - (1.0 / ecc).powi(2)).sqrt();

        let s = e_hat / ecc + incoming_asymptote_fact * n_hat;
        let s_hat = s / s.norm();

        let b_vec =
            orbit.semi_minor_axis_km() * (incoming_asymptote_fact * e_hat - (1.0 / ecc) * n_hat);

        let t = s_hat.cross(&Vector3::z());
        let t_hat = t / t.norm();
        let r_hat = s_hat.cross(&t_hat);

        // Rows are S, T, R: rotation from inertial to the B Plane
        let str_dcm = Matrix3::from_rows(&[s_hat.transpose(), t_hat.transpose(), r_hat.transpose()]);

        Ok(Self {
            b_t: b_vec.dot(&t_hat),
            b_r: b_vec.dot(&r_hat),
            ltof_s: b_vec.dot(&s_hat) / orbit.vmag_km_s(),
            str_dcm,
            frame: orbit.frame,
            epoch: orbit.epoch,
        })
    }

    pub fn b_dot_t(&self) -> f64 {
        self.b_t
    }

    pub fn b_dot_r(&self) -> f64 {
        self.b_r
    }

    pub fn ltof(&self) -> Duration {
        self.ltof_s * Unit::Second
    }

    /// Returns the B plane angle in degrees between -180 and 180
    pub fn angle(&self) -> f64 {
        self.b_dot_r().atan2(self.b_dot_t()).to_degrees()
    }

    /// Returns the B plane vector magnitude, in kilometers
    pub fn mag(&self) -> f64 {
        (self.b_dot_t().powi(2) + self.b_dot_r().powi(2)).sqrt()
    }

    /// Returns the DCM to convert to the B Plane from the inertial frame
    pub fn inertial_to_bplane(&self) -> Matrix3<f64> {
        self.str_dcm
    }
}

impl fmt::Display for BPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} B-Plane: B∙R = {:.3} km\tB∙T = {:.3} km\tAngle = {:.3} deg",
            self.frame,
            self.epoch,
            self.b_dot_r(),
            self.b_dot_t(),
            self.angle()
        )
    }
}

#[cfg(test)]
mod ut_bplane {
    use super::*;
    use crate::cosmic::EARTH_J2000;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hyperbolic_flyby() {
        let epoch = Epoch::from_tdb_seconds(0.0);
        // Incoming hyperbola with perigee at 7000 km
        let orbit = Orbit::keplerian(-20_000.0, 1.35, 20.0, 30.0, 40.0, -60.0, epoch, EARTH_J2000);
        let bplane = BPlane::new(orbit).unwrap();
        // |B| is the semi minor axis of the hyperbola
        assert_abs_diff_eq!(bplane.mag(), orbit.semi_minor_axis_km(), epsilon = 1e-6);
        // Perigee is below |B| due to the gravitational focusing
        assert!(bplane.mag() > 20_000.0 * (1.35 - 1.0));
        assert!(bplane.angle().abs() <= 180.0);
        let dcm = bplane.inertial_to_bplane();
        assert_abs_diff_eq!(dcm * dcm.transpose(), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn elliptical_rejected() {
        let epoch = Epoch::from_tdb_seconds(0.0);
        let orbit = Orbit::keplerian(7_000.0, 0.1, 20.0, 30.0, 40.0, 50.0, epoch, EARTH_J2000);
        assert!(matches!(
            BPlane::new(orbit),
            Err(AstroError::NotHyperbolic { .. })
        ));
    }
}
