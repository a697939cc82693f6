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

use super::ephemerides::{moon_state, planet_state, Asteroid, BUILTIN_ASTEROIDS_YAML};
use super::{
    dcm_j2000_to_eclipj2000, AstroError, Bodies, Frame, FrameService, IauRotation, Orbit,
    Orientation,
};
use crate::io::gravity::HarmonicsMem;
use crate::io::{ConfigAstroSnafu, ConfigError, ParseSnafu};
use crate::linalg::{Matrix3, Vector3};
use crate::time::{Epoch, TimeScale};
use anise::constants::orientations::J2000;
use anise::prelude::{Almanac, Frame as AniseFrame, Orbit as AniseOrbit};
use snafu::ResultExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

lazy_static! {
    /// The named asteroid table, parsed once from the embedded document.
    static ref BUILTIN_ASTEROIDS: Result<Vec<Asteroid>, String> =
        serde_yaml::from_str(BUILTIN_ASTEROIDS_YAML).map_err(|e| e.to_string());
}

/// State relative to another body in the J2000 equator, km and km/s
type RelState = (Vector3<f64>, Vector3<f64>);

/// Where the states of the Sun, the planets and the Moon come from.
#[derive(Clone)]
pub enum EphemerisSource {
    /// JPL development ephemerides (e.g. DE440s) loaded in an ANISE almanac.
    Almanac(Arc<Almanac>),
    /// Mean orbital elements of the planets and a truncated lunar theory. Positions are off by thousands of km, so this
    /// is only a fixture for tests which do not depend on where the planets really are.
    Analytic,
}

impl fmt::Debug for EphemerisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Almanac(_) => write!(f, "almanac"),
            Self::Analytic => write!(f, "analytic"),
        }
    }
}

// Defines Cosm, from the Greek word for "world" or "universe".
/// The immutable ephemeris and constants context shared by every computation.
///
/// It is built once and passed (usually in an `Arc`) to the dynamics, the stopping conditions and the analysis.
/// Concurrent reads are safe since nothing is mutated after construction.
#[derive(Clone)]
pub struct Cosm {
    source: EphemerisSource,
    asteroids: Vec<Asteroid>,
    gravity_fields: HashMap<Bodies, HarmonicsMem>,
    span: (Epoch, Epoch),
}

impl fmt::Debug for Cosm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cosm ({:?}) valid from {} to {} with {} asteroids",
            self.source,
            self.span.0,
            self.span.1,
            self.asteroids.len()
        )?;
        for body in self.gravity_fields.keys() {
            writeln!(f, "\tgravity field for {body}")?;
        }
        write!(f, "")
    }
}

impl fmt::Display for Cosm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Cosm {
    /// Coverage of DE440s: 1849-12-26 to 2150-01-22 TDB.
    pub fn de440s_span() -> (Epoch, Epoch) {
        (
            Epoch::from_gregorian_at_midnight(1849, 12, 26, TimeScale::TDB),
            Epoch::from_gregorian_at_midnight(2150, 1, 22, TimeScale::TDB),
        )
    }

    /// Validity of the analytic planetary ephemeris: 1800-01-01 to 2051-01-01 TDB.
    pub fn analytic_span() -> (Epoch, Epoch) {
        (
            Epoch::from_tdb_seconds(-6_311_390_400.0),
            Epoch::from_tdb_seconds(1_609_416_000.0),
        )
    }

    fn embedded_asteroids() -> Result<Vec<Asteroid>, ConfigError> {
        Ok(BUILTIN_ASTEROIDS
            .as_ref()
            .map_err(|msg| ConfigError::InvalidConfig {
                msg: format!("embedded asteroid table: {msg}"),
            })?
            .clone())
    }

    /// Builds the context on the ephemerides of the almanac, with the embedded asteroid table and the EGM96 4x4 Earth field.
    ///
    /// The span defaults to that of DE440s, use [`Cosm::with_span`] for other ephemeris files.
    pub fn from_almanac(almanac: Arc<Almanac>) -> Result<Self, ConfigError> {
        Ok(Self {
            source: EphemerisSource::Almanac(almanac),
            asteroids: Self::embedded_asteroids()?,
            gravity_fields: HashMap::new(),
            span: Self::de440s_span(),
        }
        .with_gravity_field(Bodies::Earth, HarmonicsMem::egm96_4x4()))
    }

    /// Loads the SPK file (e.g. `de440s.bsp`) in a new almanac and builds the context on it.
    pub fn load_spk(path: &str) -> Result<Self, ConfigError> {
        let almanac = Almanac::new(path)
            .map_err(|e| AstroError::AlmanacQuery {
                action: "loading",
                msg: format!("{path}: {e}"),
            })
            .context(ConfigAstroSnafu)?;
        info!("loaded ephemerides from {path}");
        Self::from_almanac(Arc::new(almanac))
    }

    /// Builds the analytic context, with the embedded asteroid table and the EGM96 4x4 Earth field.
    pub fn try_analytic() -> Result<Self, ConfigError> {
        Ok(Self::analytic_raw()
            .with_asteroids(Self::embedded_asteroids()?)
            .with_gravity_field(Bodies::Earth, HarmonicsMem::egm96_4x4()))
    }

    /// Returns the analytic context, or one without asteroids nor gravity field if the embedded table is corrupted.
    pub fn analytic() -> Arc<Self> {
        match Self::try_analytic() {
            Ok(cosm) => Arc::new(cosm),
            Err(e) => {
                error!("{e}, falling back to a context without asteroids");
                Arc::new(Self::analytic_raw())
            }
        }
    }

    /// The analytic ephemerides only, without any asteroid nor gravity field.
    pub fn analytic_raw() -> Self {
        Self {
            source: EphemerisSource::Analytic,
            asteroids: Vec::new(),
            gravity_fields: HashMap::new(),
            span: Self::analytic_span(),
        }
    }

    pub fn source(&self) -> &EphemerisSource {
        &self.source
    }

    /// Replaces the asteroid table, e.g. with test fixtures.
    pub fn with_asteroids(mut self, asteroids: Vec<Asteroid>) -> Self {
        self.asteroids = asteroids;
        self
    }

    /// Replaces the asteroid table from a YAML document listing the asteroids.
    pub fn with_asteroids_yaml(self, yaml: &str) -> Result<Self, ConfigError> {
        let asteroids = serde_yaml::from_str(yaml).context(ParseSnafu)?;
        Ok(self.with_asteroids(asteroids))
    }

    /// Sets the spherical harmonics field of a body.
    pub fn with_gravity_field(mut self, body: Bodies, field: HarmonicsMem) -> Self {
        self.gravity_fields.insert(body, field);
        self
    }

    /// Sets the span where the ephemerides are served.
    pub fn with_span(mut self, start: Epoch, end: Epoch) -> Self {
        self.span = (start, end);
        self
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    /// Returns the asteroid of that name (case insensitive)
    pub fn resolve_asteroid(&self, name: &str) -> Result<&Asteroid, AstroError> {
        self.asteroids
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| AstroError::UnknownBody {
                name: name.to_string(),
            })
    }

    pub fn gravity_field(&self, body: Bodies) -> Result<&HarmonicsMem, AstroError> {
        self.gravity_fields
            .get(&body)
            .ok_or(AstroError::NoGravityField { body })
    }

    /// State of the body relative to the center, in the J2000 equator.
    fn relative_j2000(&self, body: Bodies, center: Bodies, epoch: Epoch) -> Result<RelState, AstroError> {
        if body == center {
            return Ok((Vector3::zeros(), Vector3::zeros()));
        }
        match &self.source {
            EphemerisSource::Almanac(almanac) => {
                let at_body = AniseOrbit::new(
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                    epoch,
                    AniseFrame::new(body.naif_id(), J2000),
                );
                let rel = almanac
                    .transform_to(at_body, AniseFrame::new(center.naif_id(), J2000), None)
                    .map_err(|e| AstroError::AlmanacQuery {
                        action: "translating",
                        msg: format!("{body} from {center} at {epoch}: {e}"),
                    })?;
                Ok((
                    Vector3::new(rel.radius_km.x, rel.radius_km.y, rel.radius_km.z),
                    Vector3::new(
                        rel.velocity_km_s.x,
                        rel.velocity_km_s.y,
                        rel.velocity_km_s.z,
                    ),
                ))
            }
            EphemerisSource::Analytic => {
                let (r_body, v_body) = Self::analytic_helio_j2000(body, epoch)?;
                let (r_center, v_center) = Self::analytic_helio_j2000(center, epoch)?;
                Ok((r_body - r_center, v_body - v_center))
            }
        }
    }

    /// Heliocentric state of the body in the J2000 equator, from the analytic model.
    fn analytic_helio_j2000(body: Bodies, epoch: Epoch) -> Result<RelState, AstroError> {
        let (r_ecl, v_ecl) = match body {
            Bodies::Sun => return Ok((Vector3::zeros(), Vector3::zeros())),
            Bodies::Earth | Bodies::Moon => {
                let (r_emb, v_emb) = planet_state(Bodies::Earth, epoch)?;
                let (r_moon, v_moon) = moon_state(epoch);
                let earth_mu = Bodies::Earth.gm();
                let moon_mu = Bodies::Moon.gm();
                let frac = if body == Bodies::Earth {
                    -moon_mu / (earth_mu + moon_mu)
                } else {
                    earth_mu / (earth_mu + moon_mu)
                };
                (r_emb + frac * r_moon, v_emb + frac * v_moon)
            }
            _ => planet_state(body, epoch)?,
        };
        let dcm = dcm_j2000_to_eclipj2000().transpose();
        Ok((dcm * r_ecl, dcm * v_ecl))
    }

    /// DCM from J2000 to the orientation of the frame, and the angular velocity of that frame in J2000.
    fn orientation_from_j2000(frame: &Frame, epoch: Epoch) -> (Matrix3<f64>, Vector3<f64>) {
        match frame.orientation {
            Orientation::J2000 => (Matrix3::identity(), Vector3::zeros()),
            Orientation::Eclipj2000 => (dcm_j2000_to_eclipj2000(), Vector3::zeros()),
            Orientation::BodyFixed => {
                let rot = IauRotation::of(frame.center);
                (rot.dcm_from_j2000(epoch), rot.angular_velocity_j2000())
            }
        }
    }

    /// Expresses a state relative to the center of its frame into the J2000 axes.
    fn to_j2000_axes(state: &Orbit) -> RelState {
        let (dcm, omega) = Self::orientation_from_j2000(&state.frame, state.epoch);
        let r = dcm.transpose() * state.radius_km;
        let v = dcm.transpose() * state.velocity_km_s + omega.cross(&r);
        (r, v)
    }

    /// Rotates a J2000-axes relative state into the axes of the frame.
    fn from_j2000_axes(r: Vector3<f64>, v: Vector3<f64>, epoch: Epoch, frame: Frame) -> Orbit {
        let (dcm, omega) = Self::orientation_from_j2000(&frame, epoch);
        Orbit::new(dcm * r, dcm * (v - omega.cross(&r)), epoch, frame)
    }

    /// Returns the state of the center of the body as seen from the center of `frame`, in its axes.
    pub fn celestial_state(&self, body: Bodies, epoch: Epoch, frame: Frame) -> Result<Orbit, AstroError> {
        self.check_epoch(epoch)?;
        let (r, v) = self.relative_j2000(body, frame.center, epoch)?;
        Ok(Self::from_j2000_axes(r, v, epoch, frame))
    }

    /// Returns the state of the asteroid as seen from the center of `frame`, in its axes.
    ///
    /// Asteroids are conics around the Sun, whatever the source of the other ephemerides.
    pub fn asteroid_state(&self, asteroid: &Asteroid, epoch: Epoch, frame: Frame) -> Result<Orbit, AstroError> {
        self.check_epoch(epoch)?;
        let (r_ecl, v_ecl) = asteroid.state(epoch)?;
        let dcm = dcm_j2000_to_eclipj2000().transpose();
        let (r_sun, v_sun) = self.relative_j2000(Bodies::Sun, frame.center, epoch)?;
        Ok(Self::from_j2000_axes(
            dcm * r_ecl + r_sun,
            dcm * v_ecl + v_sun,
            epoch,
            frame,
        ))
    }
}

impl FrameService for Cosm {
    fn ephemeris_span(&self) -> (Epoch, Epoch) {
        self.span
    }

    fn try_dcm_from_to(&self, from: &Frame, to: &Frame, epoch: Epoch) -> Result<Matrix3<f64>, AstroError> {
        let (from_dcm, _) = Self::orientation_from_j2000(from, epoch);
        let (to_dcm, _) = Self::orientation_from_j2000(to, epoch);
        Ok(to_dcm * from_dcm.transpose())
    }

    fn try_frame_chg(&self, state: &Orbit, new_frame: Frame) -> Result<Orbit, AstroError> {
        if state.frame == new_frame {
            return Ok(*state);
        }
        let (mut r, mut v) = Self::to_j2000_axes(state);
        if state.frame.center != new_frame.center {
            self.check_epoch(state.epoch)?;
            let (r_center, v_center) =
                self.relative_j2000(state.frame.center, new_frame.center, state.epoch)?;
            r += r_center;
            v += v_center;
        }
        Ok(Self::from_j2000_axes(r, v, state.epoch, new_frame))
    }
}

#[cfg(test)]
mod ut_cosm {
    use super::*;
    use crate::cosmic::{AU_KM, EARTH_J2000, IAU_EARTH, MOON_J2000, SUN_ECLIPJ2000, SUN_J2000};
    use approx::assert_abs_diff_eq;

    #[test]
    fn embedded_table() {
        let cosm = Cosm::try_analytic().unwrap();
        assert!(cosm.resolve_asteroid("ceres").is_ok());
        assert!(cosm.resolve_asteroid(" Vesta ").is_ok());
        assert_eq!(
            cosm.resolve_asteroid("Oumuamua"),
            Err(AstroError::UnknownBody {
                name: "Oumuamua".to_string()
            })
        );
        assert!(cosm.gravity_field(Bodies::Earth).is_ok());
        assert!(cosm.gravity_field(Bodies::Mars).is_err());
    }

    #[test]
    fn out_of_range() {
        let cosm = Cosm::analytic_raw();
        let epoch = Epoch::from_tdb_seconds(2.0e9);
        assert!(matches!(
            cosm.celestial_state(Bodies::Earth, epoch, SUN_J2000),
            Err(AstroError::EphemerisOutOfRange { .. })
        ));
    }

    #[test]
    fn missing_spk_file() {
        let err = Cosm::load_spk("no/such/file.bsp").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConfigAstro {
                source: AstroError::AlmanacQuery { .. }
            }
        ));
    }

    #[test]
    fn earth_moon_geometry() {
        let cosm = Cosm::analytic_raw();
        let epoch = Epoch::from_tdb_seconds(86_400.0 * 365.25 * 10.0);
        let moon = cosm.celestial_state(Bodies::Moon, epoch, EARTH_J2000).unwrap();
        assert!((356_000.0..407_000.0).contains(&moon.rmag_km()));
        let earth = cosm.celestial_state(Bodies::Earth, epoch, MOON_J2000).unwrap();
        assert_abs_diff_eq!(earth.radius_km, -moon.radius_km, epsilon = 1e-6);

        let sun = cosm.celestial_state(Bodies::Sun, epoch, EARTH_J2000).unwrap();
        assert!((sun.rmag_km() / AU_KM - 1.0).abs() < 0.02);
    }

    #[test]
    fn frame_chg_round_trip() {
        let cosm = Cosm::analytic_raw();
        let epoch = Epoch::from_tdb_seconds(1.0e8);
        let leo = Orbit::keplerian(7_000.0, 0.01, 51.6, 10.0, 20.0, 30.0, epoch, EARTH_J2000);
        for frame in [SUN_J2000, SUN_ECLIPJ2000, IAU_EARTH, MOON_J2000] {
            let there = cosm.try_frame_chg(&leo, frame).unwrap();
            let back = cosm.try_frame_chg(&there, EARTH_J2000).unwrap();
            assert_abs_diff_eq!(back.radius_km, leo.radius_km, epsilon = 1e-6);
            assert_abs_diff_eq!(back.velocity_km_s, leo.velocity_km_s, epsilon = 1e-9);
        }
        // Same center, only the axes rotate
        let fixed = cosm.try_frame_chg(&leo, IAU_EARTH).unwrap();
        assert_abs_diff_eq!(fixed.rmag_km(), leo.rmag_km(), epsilon = 1e-9);
        assert_abs_diff_eq!(fixed.radius_km[2], leo.radius_km[2], epsilon = 1e-9);
    }
}
