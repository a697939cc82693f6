extern crate impactor;

use impactor::cosmic::{
    AstroError, Bodies, Cosm, EphemerisSource, FrameService, Orbit, AU_KM, EARTH_J2000, MOON_J2000,
    SUN_J2000,
};
use impactor::time::Epoch;
use impactor::ImpactorError;
use rstest::*;
use std::sync::Arc;

#[fixture]
fn cosm() -> Arc<Cosm> {
    crate::test_almanac_cosm()
}

#[rstest]
fn almanac_against_analytic(cosm: Arc<Cosm>) {
    assert!(matches!(cosm.source(), EphemerisSource::Almanac(_)));
    let analytic = crate::test_cosm();
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 6, 1);

    for (body, tolerance_km) in [
        (Bodies::Earth, 1.0e5),
        (Bodies::Mars, 5.0e5),
        (Bodies::Jupiter, 5.0e6),
    ] {
        let de = cosm.celestial_state(body, epoch, SUN_J2000).unwrap();
        let fixture = analytic.celestial_state(body, epoch, SUN_J2000).unwrap();
        let dr = (de.radius_km - fixture.radius_km).norm();
        println!("{body}: {dr:.0} km between DE440s and the analytic model");
        assert!(dr < tolerance_km);
    }

    let moon = cosm.celestial_state(Bodies::Moon, epoch, EARTH_J2000).unwrap();
    assert!((356_000.0..407_000.0).contains(&moon.rmag_km()));
    let sun = cosm.celestial_state(Bodies::Sun, epoch, EARTH_J2000).unwrap();
    assert!((sun.rmag_km() / AU_KM - 1.0).abs() < 0.02);

    // Asteroids remain conics with either source
    let ceres = cosm.resolve_asteroid("Ceres").unwrap();
    let helio = cosm.asteroid_state(ceres, epoch, SUN_J2000).unwrap();
    assert!((2.5..3.05).contains(&(helio.rmag_km() / AU_KM)));
}

#[rstest]
fn almanac_frame_changes(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 6, 1);
    let leo = Orbit::keplerian(7_000.0, 0.01, 51.6, 10.0, 20.0, 30.0, epoch, EARTH_J2000);
    for frame in [SUN_J2000, MOON_J2000] {
        let there = cosm.try_frame_chg(&leo, frame).unwrap();
        let back = cosm.try_frame_chg(&there, EARTH_J2000).unwrap();
        assert!((back.radius_km - leo.radius_km).norm() < 1e-6);
        assert!((back.velocity_km_s - leo.velocity_km_s).norm() < 1e-9);
    }
}

#[rstest]
fn outside_of_de440s(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2200, 1, 1);
    let err = cosm
        .celestial_state(Bodies::Earth, epoch, SUN_J2000)
        .unwrap_err();
    assert!(matches!(err, AstroError::EphemerisOutOfRange { .. }));
    let err: ImpactorError = err.into();
    assert!(err.is_input_error());
}
