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

use super::Frame;
use crate::linalg::{Matrix3, Vector3, Vector6};
use crate::time::{Duration, Epoch, Unit};
use std::f64::consts::TAU;
use std::fmt;

/// If an eccentricity is within this of 1.0, the orbit is treated as parabolic
pub const ECC_EPSILON: f64 = 1e-11;

/// Cartesian state of an object (position and velocity) at an epoch, in a given frame.
///
/// Mass is not propagated: only gravitational accelerations act on the object.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Orbit {
    pub epoch: Epoch,
    pub radius_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub frame: Frame,
}

impl Orbit {
    #[allow(clippy::too_many_arguments)]
    pub fn cartesian(
        x_km: f64,
        y_km: f64,
        z_km: f64,
        vx_km_s: f64,
        vy_km_s: f64,
        vz_km_s: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        Self {
            epoch,
            radius_km: Vector3::new(x_km, y_km, z_km),
            velocity_km_s: Vector3::new(vx_km_s, vy_km_s, vz_km_s),
            frame,
        }
    }

    pub fn new(radius_km: Vector3<f64>, velocity_km_s: Vector3<f64>, epoch: Epoch, frame: Frame) -> Self {
        Self {
            epoch,
            radius_km,
            velocity_km_s,
            frame,
        }
    }

    /// Creates a new Orbit from the provided vector, whose first three components are the position in km
    /// and the last three the velocity in km/s.
    pub fn cartesian_vec(state: &Vector6<f64>, epoch: Epoch, frame: Frame) -> Self {
        let mut me = Self::new(Vector3::zeros(), Vector3::zeros(), epoch, frame);
        me.set(epoch, state);
        me
    }

    /// Creates a new Orbit around the center of the provided frame from the Keplerian orbital elements.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees
    ///
    /// Parabolic orbits are not supported: the eccentricity is nudged away from one with a warning.
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian(
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ta_deg: f64,
        epoch: Epoch,
        frame: Frame,
    ) -> Self {
        let gm = frame.gm();
        let ecc = if (ecc - 1.0).abs() < ECC_EPSILON {
            warn!("parabolic orbits are not supported, using e = {}", 1.0 - ECC_EPSILON);
            1.0 - ECC_EPSILON
        } else {
            ecc.abs()
        };
        let (radius_km, velocity_km_s) = perifocal_to_inertial(
            gm,
            sma_km * (1.0 - ecc.powi(2)),
            ecc,
            inc_deg.to_radians(),
            raan_deg.to_radians(),
            aop_deg.to_radians(),
            ta_deg.to_radians(),
        );
        Self::new(radius_km, velocity_km_s, epoch, frame)
    }

    /// Returns this state as a Cartesian Vector6 in [km, km, km, km/s, km/s, km/s]
    pub fn to_cartesian_vec(self) -> Vector6<f64> {
        Vector6::new(
            self.radius_km[0],
            self.radius_km[1],
            self.radius_km[2],
            self.velocity_km_s[0],
            self.velocity_km_s[1],
            self.velocity_km_s[2],
        )
    }

    /// Sets the epoch and the position and velocity from the provided vector
    pub fn set(&mut self, epoch: Epoch, vector: &Vector6<f64>) {
        self.epoch = epoch;
        self.radius_km = vector.fixed_rows::<3>(0).into_owned();
        self.velocity_km_s = vector.fixed_rows::<3>(3).into_owned();
    }

    /// Rebuilds a state `delta_t_s` seconds after this one from the provided vector
    pub fn set_with_delta_seconds(mut self, delta_t_s: f64, vector: &Vector6<f64>) -> Self {
        self.set(self.epoch + delta_t_s * Unit::Second, vector);
        self
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_finite(&self) -> bool {
        self.radius_km.iter().all(|x| x.is_finite())
            && self.velocity_km_s.iter().all(|x| x.is_finite())
    }

    pub fn rmag_km(&self) -> f64 {
        self.radius_km.norm()
    }

    pub fn vmag_km_s(&self) -> f64 {
        self.velocity_km_s.norm()
    }

    /// Altitude above the mean equatorial radius of the center body
    pub fn altitude_km(&self) -> f64 {
        self.rmag_km() - self.frame.equatorial_radius_km()
    }

    /// Distance between the positions of both states, which must be in the same frame
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.radius_km - other.radius_km).norm()
    }

    /// Returns the orbital momentum vector
    pub fn hvec(&self) -> Vector3<f64> {
        self.radius_km.cross(&self.velocity_km_s)
    }

    pub fn hmag(&self) -> f64 {
        self.hvec().norm()
    }

    /// Returns the eccentricity vector (no unit)
    pub fn evec(&self) -> Vector3<f64> {
        let r = self.radius_km;
        let v = self.velocity_km_s;
        let gm = self.frame.gm();
        ((v.norm_squared() - gm / r.norm()) * r - r.dot(&v) * v) / gm
    }

    pub fn ecc(&self) -> f64 {
        self.evec().norm()
    }

    /// Specific mechanical energy in km^2/s^2
    pub fn energy_km2_s2(&self) -> f64 {
        self.vmag_km_s().powi(2) / 2.0 - self.frame.gm() / self.rmag_km()
    }

    /// Semi major axis in km, negative for hyperbolic orbits
    pub fn sma_km(&self) -> f64 {
        -self.frame.gm() / (2.0 * self.energy_km2_s2())
    }

    /// Semi minor axis in km, always positive
    pub fn semi_minor_axis_km(&self) -> f64 {
        let ecc = self.ecc();
        if ecc <= 1.0 {
            (self.sma_km().powi(2) * (1.0 - ecc.powi(2))).sqrt()
        } else {
            self.hmag().powi(2) / (self.frame.gm() * (ecc.powi(2) - 1.0).sqrt())
        }
    }

    pub fn inc_deg(&self) -> f64 {
        (self.hvec()[2] / self.hmag()).acos().to_degrees()
    }

    /// Returns the true anomaly in degrees between 0 and 360.0
    pub fn ta_deg(&self) -> f64 {
        let evec = self.evec();
        let ecc = evec.norm();
        if ecc < ECC_EPSILON {
            warn!("true anomaly ill-defined for circular orbit (e = {})", ecc);
        }
        let cos_nu = evec.dot(&self.radius_km) / (ecc * self.rmag_km());
        let ta = cos_nu.clamp(-1.0, 1.0).acos();
        if self.radius_km.dot(&self.velocity_km_s) < 0.0 {
            (TAU - ta).to_degrees()
        } else {
            ta.to_degrees()
        }
    }

    /// Orbital period, only meaningful for closed orbits
    pub fn period(&self) -> Duration {
        TAU * (self.sma_km().powi(3) / self.frame.gm()).sqrt() * Unit::Second
    }

    /// Adds the provided delta-v (in km/s, expressed in the axes of this frame) to the velocity
    pub fn apply_dv_km_s(&mut self, dv_km_s: Vector3<f64>) {
        self.velocity_km_s += dv_km_s;
    }

    /// Returns a copy of this state with the provided delta-v applied
    pub fn with_dv_km_s(mut self, dv_km_s: Vector3<f64>) -> Self {
        self.apply_dv_km_s(dv_km_s);
        self
    }

    /// Returns the DCM from the VNC frame of this state (velocity, orbit normal, co-normal) to the axes of its frame.
    pub fn dcm_from_vnc(&self) -> Matrix3<f64> {
        let v = self.velocity_km_s / self.vmag_km_s();
        let n = self.hvec() / self.hmag();
        let c = v.cross(&n);
        Matrix3::from_columns(&[v, n, c])
    }
}

impl fmt::Display for Orbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        write!(
            f,
            "[{}] {}\tposition = [{:.*}, {:.*}, {:.*}] km\tvelocity = [{:.*}, {:.*}, {:.*}] km/s",
            self.frame,
            self.epoch,
            decimals,
            self.radius_km[0],
            decimals,
            self.radius_km[1],
            decimals,
            self.radius_km[2],
            decimals,
            self.velocity_km_s[0],
            decimals,
            self.velocity_km_s[1],
            decimals,
            self.velocity_km_s[2]
        )
    }
}

/// Position and velocity from the conic parameters, all angles in radians.
pub(crate) fn perifocal_to_inertial(
    gm: f64,
    semi_parameter_km: f64,
    ecc: f64,
    inc: f64,
    raan: f64,
    aop: f64,
    ta: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let p = semi_parameter_km;
    let radius = p / (1.0 + ecc * ta.cos());
    let (sin_aop_ta, cos_aop_ta) = (aop + ta).sin_cos();
    let (sin_inc, cos_inc) = inc.sin_cos();
    let (sin_raan, cos_raan) = raan.sin_cos();
    let (sin_aop, cos_aop) = aop.sin_cos();

    let x = radius * (cos_aop_ta * cos_raan - cos_inc * sin_aop_ta * sin_raan);
    let y = radius * (cos_aop_ta * sin_raan + cos_inc * sin_aop_ta * cos_raan);
    let z = radius * sin_aop_ta * sin_inc;

    let sqrt_gm_p = (gm / p).sqrt();
    let cos_ta_ecc = ta.cos() + ecc;
    let sin_ta = ta.sin();

    let vx = sqrt_gm_p * cos_ta_ecc * (-sin_aop * cos_raan - cos_inc * sin_raan * cos_aop)
        - sqrt_gm_p * sin_ta * (cos_aop * cos_raan - cos_inc * sin_raan * sin_aop);
    let vy = sqrt_gm_p * cos_ta_ecc * (-sin_aop * sin_raan + cos_inc * cos_raan * cos_aop)
        - sqrt_gm_p * sin_ta * (cos_aop * sin_raan + cos_inc * cos_raan * sin_aop);
    let vz = sqrt_gm_p * (cos_ta_ecc * sin_inc * cos_aop - sin_ta * sin_inc * sin_aop);

    (Vector3::new(x, y, z), Vector3::new(vx, vy, vz))
}

#[cfg(test)]
mod ut_orbit {
    use super::*;
    use crate::cosmic::{EARTH_J2000, SUN_J2000};
    use crate::time::TimeUnits;
    use approx::assert_abs_diff_eq;

    #[test]
    fn keplerian_round_trip() {
        let epoch = Epoch::from_tdb_seconds(0.0);
        let orbit = Orbit::keplerian(8_000.0, 0.2, 30.0, 45.0, 60.0, 120.0, epoch, EARTH_J2000);
        assert_abs_diff_eq!(orbit.sma_km(), 8_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(orbit.ecc(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(orbit.inc_deg(), 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(orbit.ta_deg(), 120.0, epsilon = 1e-9);
    }

    #[test]
    fn circular_velocity() {
        let epoch = Epoch::from_tdb_seconds(0.0);
        let orbit = Orbit::keplerian(149_597_870.7, 0.0, 0.0, 0.0, 0.0, 0.0, epoch, SUN_J2000);
        let v_circ = (SUN_J2000.gm() / 149_597_870.7_f64).sqrt();
        assert_abs_diff_eq!(orbit.vmag_km_s(), v_circ, epsilon = 1e-10);
        // About one sidereal year
        assert!((orbit.period() - 365.25.days()).abs() < 1.days());
    }

    #[test]
    fn vector_round_trip() {
        let epoch = Epoch::from_tdb_seconds(10.0);
        let orbit = Orbit::cartesian(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, epoch, SUN_J2000);
        let rebuilt = Orbit::cartesian_vec(&orbit.to_cartesian_vec(), epoch, SUN_J2000);
        assert_eq!(orbit, rebuilt);
    }

    #[test]
    fn vnc_frame() {
        let epoch = Epoch::from_tdb_seconds(0.0);
        let orbit = Orbit::cartesian(7_000.0, 0.0, 0.0, 0.0, 7.5, 0.0, epoch, EARTH_J2000);
        let dcm = orbit.dcm_from_vnc();
        // V along +Y, N along +Z, C along +X
        assert_abs_diff_eq!(dcm * Vector3::x(), Vector3::y(), epsilon = 1e-12);
        assert_abs_diff_eq!(dcm * Vector3::y(), Vector3::z(), epsilon = 1e-12);
        assert_abs_diff_eq!(dcm * Vector3::z(), Vector3::x(), epsilon = 1e-12);
    }
}
