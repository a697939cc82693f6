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

//! Conics of the named asteroids, and the analytic ephemerides of the major bodies.
//!
//! The asteroids are conics around the Sun. The planets use the JPL approximate Keplerian elements with secular
//! rates (valid 1800 AD to 2050 AD) and the Moon a low precision lunar theory: these only back the
//! [`EphemerisSource::Analytic`](super::EphemerisSource::Analytic) fixture, real analyses use an almanac.
//! All positions are heliocentric, in the ecliptic and equinox of J2000, in km and km/s.

use super::orbit::perifocal_to_inertial;
use super::{AstroError, Bodies, AU_KM, DAYS_PER_CENTURY, SECONDS_PER_DAY};
use crate::io::{epoch_from_str, epoch_to_str};
use crate::linalg::Vector3;
use crate::time::{Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Solves Kepler's equation for the eccentric anomaly (radians), for an elliptical orbit.
pub fn solve_kepler(mean_anomaly: f64, ecc: f64) -> Result<f64, AstroError> {
    let mean_anomaly = mean_anomaly.rem_euclid(TAU);
    let mut ecc_anomaly = if ecc > 0.8 { std::f64::consts::PI } else { mean_anomaly };
    for _ in 0..50 {
        let delta = (ecc_anomaly - ecc * ecc_anomaly.sin() - mean_anomaly)
            / (1.0 - ecc * ecc_anomaly.cos());
        ecc_anomaly -= delta;
        if delta.abs() < 1e-14 {
            return Ok(ecc_anomaly);
        }
    }
    Err(AstroError::KeplerNoConvergence { ecc })
}

/// Heliocentric position and velocity from mean elements, angles in radians.
#[allow(clippy::too_many_arguments)]
fn conic_state(
    gm: f64,
    sma_km: f64,
    ecc: f64,
    inc: f64,
    raan: f64,
    aop: f64,
    mean_anomaly: f64,
) -> Result<(Vector3<f64>, Vector3<f64>), AstroError> {
    let ecc_anomaly = solve_kepler(mean_anomaly, ecc)?;
    let ta = 2.0
        * ((1.0 + ecc).sqrt() * (ecc_anomaly / 2.0).sin())
            .atan2((1.0 - ecc).sqrt() * (ecc_anomaly / 2.0).cos());
    Ok(perifocal_to_inertial(
        gm,
        sma_km * (1.0 - ecc.powi(2)),
        ecc,
        inc,
        raan,
        aop,
        ta,
    ))
}

/// Keplerian elements and their rates per Julian century: a (au), e, I (deg), L (deg), long. peri. (deg), long. node (deg)
#[derive(Copy, Clone, Debug)]
struct MeanElements {
    elements: [f64; 6],
    rates: [f64; 6],
}

const fn planet_elements(body: Bodies) -> Option<MeanElements> {
    match body {
        Bodies::Mercury => Some(MeanElements {
            elements: [0.387_099_27, 0.205_635_93, 7.004_979_02, 252.250_323_50, 77.457_796_28, 48.330_765_93],
            rates: [0.000_000_37, 0.000_019_06, -0.005_947_49, 149_472.674_111_75, 0.160_476_89, -0.125_340_81],
        }),
        Bodies::Venus => Some(MeanElements {
            elements: [0.723_335_66, 0.006_776_72, 3.394_676_05, 181.979_099_50, 131.602_467_18, 76.679_842_55],
            rates: [0.000_003_90, -0.000_041_07, -0.000_788_90, 58_517.815_387_29, 0.002_683_29, -0.277_694_18],
        }),
        // This is the Earth-Moon barycenter
        Bodies::Earth => Some(MeanElements {
            elements: [1.000_002_61, 0.016_711_23, -0.000_015_31, 100.464_571_66, 102.937_681_93, 0.0],
            rates: [0.000_005_62, -0.000_043_92, -0.012_946_68, 35_999.372_449_81, 0.323_273_64, 0.0],
        }),
        Bodies::Mars => Some(MeanElements {
            elements: [1.523_710_34, 0.093_394_10, 1.849_691_42, -4.553_432_05, -23.943_629_59, 49.559_538_91],
            rates: [0.000_018_47, 0.000_078_82, -0.008_131_31, 19_140.302_684_99, 0.444_410_88, -0.292_573_43],
        }),
        Bodies::Jupiter => Some(MeanElements {
            elements: [5.202_887_00, 0.048_386_24, 1.304_396_95, 34.396_440_51, 14.728_479_83, 100.473_909_09],
            rates: [-0.000_116_07, -0.000_132_53, -0.001_837_14, 3_034.746_127_75, 0.212_526_68, 0.204_691_06],
        }),
        Bodies::Saturn => Some(MeanElements {
            elements: [9.536_675_94, 0.053_861_79, 2.485_991_87, 49.954_244_23, 92.598_878_31, 113.662_424_48],
            rates: [-0.001_250_60, -0.000_509_91, 0.001_936_09, 1_222.493_622_01, -0.418_972_16, -0.288_677_94],
        }),
        Bodies::Uranus => Some(MeanElements {
            elements: [19.189_164_64, 0.047_257_44, 0.772_637_83, 313.238_104_51, 170.954_276_30, 74.016_925_03],
            rates: [-0.001_961_76, -0.000_043_97, -0.002_429_39, 428.482_027_85, 0.408_052_81, 0.042_405_89],
        }),
        Bodies::Neptune => Some(MeanElements {
            elements: [30.069_922_76, 0.008_590_48, 1.770_043_47, -55.120_029_69, 44.964_762_27, 131.784_225_74],
            rates: [0.000_262_91, 0.000_051_05, 0.000_353_72, 218.459_453_25, -0.322_414_64, -0.005_086_64],
        }),
        Bodies::Pluto => Some(MeanElements {
            elements: [39.482_116_75, 0.248_827_30, 17.140_012_06, 238.929_038_33, 224.068_916_29, 110.303_936_84],
            rates: [-0.000_315_96, 0.000_051_70, 0.000_048_18, 145.207_805_15, -0.040_629_42, -0.011_834_82],
        }),
        Bodies::Sun | Bodies::Moon => None,
    }
}

/// Julian centuries of TDB since J2000
fn centuries_tdb(epoch: Epoch) -> f64 {
    epoch.to_tdb_seconds() / (DAYS_PER_CENTURY * SECONDS_PER_DAY)
}

/// Heliocentric state of a planet (system barycenter, Earth-Moon barycenter for the Earth).
pub(crate) fn planet_state(body: Bodies, epoch: Epoch) -> Result<(Vector3<f64>, Vector3<f64>), AstroError> {
    let mean = match planet_elements(body) {
        Some(mean) => mean,
        None => return Ok((Vector3::zeros(), Vector3::zeros())),
    };
    let t = centuries_tdb(epoch);
    let mut el = [0.0; 6];
    for (i, item) in el.iter_mut().enumerate() {
        *item = mean.elements[i] + mean.rates[i] * t;
    }
    let [sma_au, ecc, inc_deg, mean_long_deg, long_peri_deg, long_node_deg] = el;

    let gm = Bodies::Sun.gm()
        + if body == Bodies::Earth {
            Bodies::Earth.gm() + Bodies::Moon.gm()
        } else {
            body.gm()
        };

    conic_state(
        gm,
        sma_au * AU_KM,
        ecc,
        inc_deg.to_radians(),
        long_node_deg.to_radians(),
        (long_peri_deg - long_node_deg).to_radians(),
        (mean_long_deg - long_peri_deg).to_radians(),
    )
}

/// Geocentric position of the Moon in km, low precision (about 10 arcseconds in longitude).
fn moon_position(epoch: Epoch) -> Vector3<f64> {
    const ARCSEC: f64 = 1.0 / 206_264.806_247_096_36;
    let t = centuries_tdb(epoch);
    let frac = |x: f64| x - x.floor();

    // Mean arguments
    let l0 = frac(0.606_433 + 1_336.851_344 * t);
    let l = TAU * frac(0.374_897 + 1_325.552_410 * t);
    let lp = TAU * frac(0.993_133 + 99.997_361 * t);
    let d = TAU * frac(0.827_361 + 1_236.853_086 * t);
    let f = TAU * frac(0.259_086 + 1_342.227_825 * t);

    // Perturbations in longitude, arcseconds
    let dl = 22_640.0 * l.sin() - 4_586.0 * (l - 2.0 * d).sin()
        + 2_370.0 * (2.0 * d).sin()
        + 769.0 * (2.0 * l).sin()
        - 668.0 * lp.sin()
        - 412.0 * (2.0 * f).sin()
        - 212.0 * (2.0 * l - 2.0 * d).sin()
        - 206.0 * (l + lp - 2.0 * d).sin()
        + 192.0 * (l + 2.0 * d).sin()
        - 165.0 * (lp - 2.0 * d).sin()
        - 125.0 * d.sin()
        - 110.0 * (l + lp).sin()
        + 148.0 * (l - lp).sin()
        - 55.0 * (2.0 * f - 2.0 * d).sin();

    let long = TAU * frac(l0 + dl / 1_296.0e3);
    let s = f + (dl + 412.0 * (2.0 * f).sin() + 541.0 * lp.sin()) * ARCSEC;
    let h = f - 2.0 * d;
    let n = -526.0 * h.sin() + 44.0 * (l + h).sin() - 31.0 * (-l + h).sin()
        - 23.0 * (lp + h).sin()
        + 11.0 * (-lp + h).sin()
        - 25.0 * (-2.0 * l + f).sin()
        + 21.0 * (-l + f).sin();
    let lat = (18_520.0 * s.sin() + n) * ARCSEC;

    let dist_km = 385_000.0 - 20_905.0 * l.cos() - 3_699.0 * (2.0 * d - l).cos()
        - 2_956.0 * (2.0 * d).cos()
        - 570.0 * (2.0 * l).cos()
        + 246.0 * (2.0 * l - 2.0 * d).cos()
        - 205.0 * (lp - 2.0 * d).cos()
        - 171.0 * (l + 2.0 * d).cos()
        - 152.0 * (l + lp - 2.0 * d).cos();

    // From the ecliptic of date to the ecliptic of J2000 (general precession in longitude)
    let long_j2k = long - (1.396_971_3 * t).to_radians();

    dist_km
        * Vector3::new(
            long_j2k.cos() * lat.cos(),
            long_j2k.sin() * lat.cos(),
            lat.sin(),
        )
}

/// Geocentric state of the Moon, the velocity is computed by central differences.
pub(crate) fn moon_state(epoch: Epoch) -> (Vector3<f64>, Vector3<f64>) {
    const HALF_WIDTH_S: f64 = 30.0;
    let before = moon_position(epoch - HALF_WIDTH_S * Unit::Second);
    let after = moon_position(epoch + HALF_WIDTH_S * Unit::Second);
    (moon_position(epoch), (after - before) / (2.0 * HALF_WIDTH_S))
}

/// A named asteroid whose gravity may perturb the propagated object.
///
/// The ephemeris is a heliocentric conic from osculating elements (ecliptic J2000) at `epoch`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub name: String,
    pub gm_km3_s2: f64,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    pub sma_au: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub raan_deg: f64,
    pub aop_deg: f64,
    pub ma_deg: f64,
}

impl Asteroid {
    /// Heliocentric ecliptic J2000 state at the requested epoch
    pub fn state(&self, epoch: Epoch) -> Result<(Vector3<f64>, Vector3<f64>), AstroError> {
        let gm = Bodies::Sun.gm() + self.gm_km3_s2;
        let sma_km = self.sma_au * AU_KM;
        let mean_motion = (gm / sma_km.powi(3)).sqrt();
        let ma = self.ma_deg.to_radians() + mean_motion * (epoch - self.epoch).to_seconds();
        conic_state(
            gm,
            sma_km,
            self.ecc,
            self.inc_deg.to_radians(),
            self.raan_deg.to_radians(),
            self.aop_deg.to_radians(),
            ma,
        )
    }
}

/// Approximate osculating elements of the most massive main belt asteroids.
pub(crate) const BUILTIN_ASTEROIDS_YAML: &str = r#"
- name: Ceres
  gm_km3_s2: 62.6284
  epoch: 2000-01-01T12:00:00 TDB
  sma_au: 2.7670963
  ecc: 0.0789126
  inc_deg: 10.58335
  raan_deg: 80.48632
  aop_deg: 73.98482
  ma_deg: 6.06831
- name: Pallas
  gm_km3_s2: 13.665878
  epoch: 2000-01-01T12:00:00 TDB
  sma_au: 2.7721533
  ecc: 0.2299231
  inc_deg: 34.84100
  raan_deg: 173.12737
  aop_deg: 310.46036
  ma_deg: 352.98919
- name: Vesta
  gm_km3_s2: 17.288245
  epoch: 2000-01-01T12:00:00 TDB
  sma_au: 2.3617780
  ecc: 0.0900227
  inc_deg: 7.13394
  raan_deg: 103.95131
  aop_deg: 149.58736
  ma_deg: 341.01374
- name: Hygiea
  gm_km3_s2: 5.78
  epoch: 2000-01-01T12:00:00 TDB
  sma_au: 3.1367843
  ecc: 0.1200948
  inc_deg: 3.84075
  raan_deg: 283.44140
  aop_deg: 315.05488
  ma_deg: 85.60420
- name: Interamnia
  gm_km3_s2: 2.19
  epoch: 2000-01-01T12:00:00 TDB
  sma_au: 3.0624131
  ecc: 0.1481462
  inc_deg: 17.30880
  raan_deg: 280.40670
  aop_deg: 95.38120
  ma_deg: 47.50950
- name: Euphrosyne
  gm_km3_s2: 1.12
  epoch: 2000-01-01T12:00:00 TDB
  sma_au: 3.1550713
  ecc: 0.2277584
  inc_deg: 26.31890
  raan_deg: 31.19870
  aop_deg: 61.46410
  ma_deg: 305.26100
"#;

#[cfg(test)]
mod ut_ephem {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kepler_equation() {
        for ecc in [0.0, 0.1, 0.5, 0.9, 0.99] {
            for ma in [0.0, 0.5, 2.0, 3.1, 5.0] {
                let ea = solve_kepler(ma, ecc).unwrap();
                assert_abs_diff_eq!(ea - ecc * ea.sin(), ma, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn earth_one_au() {
        let epoch = Epoch::from_tdb_seconds(0.0);
        let (r, v) = planet_state(Bodies::Earth, epoch).unwrap();
        let r_au = r.norm() / AU_KM;
        assert!((0.98..1.02).contains(&r_au), "EMB at {r_au} AU");
        assert!((v.norm() - 29.8).abs() < 1.0, "EMB speed {}", v.norm());
        // Near the ecliptic
        assert!(r[2].abs() < 1e4);
    }

    #[test]
    fn moon_distance() {
        let epoch = Epoch::from_tdb_seconds(123_456_789.0);
        let (r, v) = moon_state(epoch);
        assert!((356_000.0..407_000.0).contains(&r.norm()));
        assert!((v.norm() - 1.02).abs() < 0.1, "Moon speed {}", v.norm());
    }

    #[test]
    fn embedded_asteroids_parse() {
        let table: Vec<Asteroid> = serde_yaml::from_str(BUILTIN_ASTEROIDS_YAML).unwrap();
        assert_eq!(table[0].name, "Ceres");
        let (r, _) = table[0].state(table[0].epoch).unwrap();
        assert!((2.5..3.0).contains(&(r.norm() / AU_KM)));
    }
}
