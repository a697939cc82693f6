extern crate impactor;

use super::asteroid;
use impactor::cosmic::{Bodies, Cosm, Orbit, EARTH_J2000, SUN_J2000};
use impactor::dynamics::{ForceModelConfig, GravityMode, OrbitalDynamics};
use impactor::md::trajectory::{sample, Traj};
use impactor::propagators::{PropOpts, Propagator};
use impactor::time::{Duration, Epoch, TimeUnits};
use impactor::ImpactorError;
use rstest::*;
use std::sync::Arc;

#[fixture]
fn cosm() -> Arc<Cosm> {
    crate::test_cosm()
}

#[rstest]
#[case::sun_only(ForceModelConfig::sun_only())]
#[case::all_bodies(ForceModelConfig::all_point_masses())]
#[case::with_asteroids(ForceModelConfig::all_point_masses().with_asteroid("Ceres").with_asteroid("Vesta"))]
fn round_trip(cosm: Arc<Cosm>, #[case] forces: ForceModelConfig) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2001, 1, 2);
    let initial = asteroid(epoch);
    let dynamics = OrbitalDynamics::from_config(&forces, SUN_J2000, cosm.clone()).unwrap();
    let prop = Propagator::default(dynamics);

    let there = prop
        .with(initial, cosm.clone())
        .for_duration(60.days())
        .unwrap();
    assert_eq!(there.epoch, epoch + 60.days());

    let back = prop.with(there, cosm).until_epoch(epoch).unwrap();
    assert_eq!(back.epoch, epoch);

    let dr = (back.radius_km - initial.radius_km).norm();
    let dv = (back.velocity_km_s - initial.velocity_km_s).norm();
    println!("round trip error: {dr:.3e} km, {dv:.3e} km/s");
    assert!(dr < 1e-2, "position error of {dr} km");
    assert!(dv < 1e-9, "velocity error of {dv} km/s");
}

#[rstest]
fn circular_sun_orbit_periods(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let initial = Orbit::keplerian(149_597_870.7, 0.0, 10.0, 20.0, 0.0, 45.0, epoch, SUN_J2000);
    let dynamics =
        OrbitalDynamics::from_config(&ForceModelConfig::sun_only(), SUN_J2000, cosm.clone())
            .unwrap();
    let prop = Propagator::default(dynamics);

    let periods = 3;
    let duration = initial.period() * periods as i64;
    let (last, traj) = prop
        .with(initial, cosm)
        .for_duration_with_traj(duration)
        .unwrap();

    let dr = (last.radius_km - initial.radius_km).norm();
    let dv = (last.velocity_km_s - initial.velocity_km_s).norm();
    println!("{periods} periods in {} steps: {dr:.3e} km, {dv:.3e} km/s", traj.len());
    assert!(dr < 5e-2, "position error of {dr} km");
    assert!(dv < 1e-8, "velocity error of {dv} km/s");

    // Every accepted state of a circular orbit is on the circle
    for state in &traj.states {
        assert!((state.rmag_km() - initial.rmag_km()).abs() < 1e-2);
    }
}

#[rstest]
fn leo_round_trip_with_harmonics(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 6, 1);
    let leo = Orbit::keplerian(7_000.0, 0.01, 51.6, 30.0, 60.0, 10.0, epoch, EARTH_J2000);
    let forces = ForceModelConfig::default()
        .with(Bodies::Earth, GravityMode::SphericalHarmonics)
        .with(Bodies::Moon, GravityMode::PointMass)
        .with(Bodies::Sun, GravityMode::PointMass)
        .with_harmonics(4, 4);
    let dynamics = OrbitalDynamics::from_config(&forces, EARTH_J2000, cosm.clone()).unwrap();
    let prop = Propagator::rkf78(dynamics, PropOpts::with_tolerances(1e-12, 1e-13));

    let there = prop.with(leo, cosm.clone()).for_duration(6.hours()).unwrap();
    // The harmonics and the third bodies move it away from the two body solution
    let two_body = Propagator::default(OrbitalDynamics::two_body())
        .with(leo, cosm.clone())
        .for_duration(6.hours())
        .unwrap();
    assert!((there.radius_km - two_body.radius_km).norm() > 1.0);

    let back = prop.with(there, cosm).for_duration(-6.hours()).unwrap();
    assert_eq!(back.epoch, epoch);
    assert!((back.radius_km - leo.radius_km).norm() < 1e-2);
}

#[rstest]
fn chained_propagations_share_one_state(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2001, 1, 2);
    let dynamics =
        OrbitalDynamics::from_config(&ForceModelConfig::sun_only(), SUN_J2000, cosm.clone())
            .unwrap();
    let prop = Propagator::default(dynamics);

    let (mid, first) = prop
        .with(asteroid(epoch), cosm.clone())
        .for_duration_with_traj(5.days())
        .unwrap();
    let (end, second) = prop
        .with(mid, cosm)
        .for_duration_with_traj(5.days())
        .unwrap();
    // Both trajectories hold the state at the junction
    assert_eq!(first.last().unwrap().epoch, mid.epoch);
    assert_eq!(second.first().unwrap().epoch, mid.epoch);

    let mut traj = first.clone();
    for state in &second.states {
        traj.push(*state);
    }
    assert_eq!(traj.len(), first.len() + second.len() - 1);
    assert_eq!(traj.last().unwrap().epoch, end.epoch);
    assert!(traj.states.windows(2).all(|w| w[0].epoch < w[1].epoch));
    assert!(traj.at(mid.epoch + 1.hours()).is_ok());

    let raw = sample(&traj, epoch, end.epoch, Duration::ZERO).unwrap();
    assert_eq!(raw.len(), traj.len());

    // The final state emitted twice is only exported once
    let mut states = first.states.clone();
    states.push(mid);
    let doubled = Traj { name: None, states };
    let raw = sample(&doubled, epoch, mid.epoch, Duration::ZERO).unwrap();
    assert_eq!(raw.len(), first.len());
    assert_eq!(raw.last().unwrap().epoch, mid.epoch);
}

#[rstest]
fn out_of_ephemeris_span(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2050, 12, 1);
    let prop = Propagator::default(
        OrbitalDynamics::from_config(&ForceModelConfig::all_point_masses(), SUN_J2000, cosm.clone())
            .unwrap(),
    );
    let mut instance = prop.with(asteroid(epoch), cosm);
    let err: ImpactorError = instance.for_duration(60.days()).unwrap_err().into();
    assert!(matches!(err, ImpactorError::EphemerisOutOfRange { .. }));
    assert!(err.is_input_error());
    // Nothing was integrated
    assert_eq!(instance.state.epoch, epoch);
}
