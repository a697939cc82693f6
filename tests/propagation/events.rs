extern crate impactor;

use super::asteroid;
use impactor::cosmic::{Bodies, Cosm, FrameService, Orbit, EARTH_J2000, SUN_J2000};
use impactor::dynamics::{ForceModelConfig, OrbitalDynamics};
use impactor::linalg::Vector3;
use impactor::md::events::*;
use impactor::propagators::{PropOpts, Propagator};
use impactor::time::{Epoch, TimeUnits, Unit};
use rstest::*;
use std::f64::consts::TAU;
use std::sync::Arc;

#[fixture]
fn cosm() -> Arc<Cosm> {
    crate::test_cosm()
}

const RP_KM: f64 = 7_000.0;
const RA_KM: f64 = 20_000.0;

/// An Earth orbit between 7000 and 20000 km, at the provided true anomaly
fn elliptical(ta_deg: f64, epoch: Epoch) -> Orbit {
    let sma = 0.5 * (RP_KM + RA_KM);
    let ecc = (RA_KM - RP_KM) / (RA_KM + RP_KM);
    Orbit::keplerian(sma, ecc, 28.5, 15.0, 40.0, ta_deg, epoch, EARTH_J2000)
}

/// Time since periapsis of a Keplerian orbit at a given radius, on the way out
fn time_since_periapsis_s(orbit: &Orbit, radius_km: f64) -> f64 {
    let sma = orbit.sma_km();
    let ecc = orbit.ecc();
    let ea = ((1.0 - radius_km / sma) / ecc).acos();
    let ma = ea - ecc * ea.sin();
    ma / (TAU / orbit.period().to_seconds())
}

#[rstest]
fn threshold_crossing_precision(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let periapsis = elliptical(0.0, epoch);
    let radius_km = 15_000.0;
    let expected = epoch + time_since_periapsis_s(&periapsis, radius_km) * Unit::Second;

    let condition = StopCondition::new(StateFunction::Rmag, radius_km, Trigger::ThresholdIncreasing)
        .with_tolerance(1e-5)
        .with_epoch_precision(10 * Unit::Microsecond)
        .stopping();
    let mut engine = StopEngine::new(vec![condition.clone()], cosm.clone()).unwrap();
    let prop = Propagator::default(OrbitalDynamics::two_body());
    let stopped = prop
        .with(periapsis, cosm.clone())
        .until_stopped(1.days(), &mut engine)
        .unwrap();

    assert!(stopped.stopped);
    let detection = stopped.stopped_by().unwrap();
    assert_eq!(detection.edge, EventEdge::Rising);
    let error = (detection.state.epoch - expected).abs();
    println!("{} detected {error} from {expected}", detection.repr);
    assert!(error < 1 * Unit::Millisecond, "crossing off by {error}");
    assert!((detection.value - radius_km).abs() < 1e-3);

    // The propagation stopped on the detection
    assert_eq!(stopped.final_state.epoch, detection.state.epoch);
    assert_eq!(stopped.traj.last().unwrap().epoch, detection.state.epoch);

    // Same crossing when propagating backward from the apoapsis: the radius decreases in physical time
    let apoapsis = prop
        .with(periapsis, cosm.clone())
        .for_duration(periapsis.period() * 0.5)
        .unwrap();
    let mut engine = StopEngine::new(vec![condition], cosm.clone()).unwrap();
    let backward = prop
        .with(apoapsis, cosm)
        .until_stopped(-1.days(), &mut engine)
        .unwrap();
    let detection = backward.stopped_by().unwrap();
    assert!((detection.state.epoch - expected).abs() < 1 * Unit::Millisecond);
}

#[rstest]
fn impact_supersedes_close_approach(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    // Starts below the impact altitude just before periapsis: the first crossing is on the next revolution
    let initial = elliptical(-12.0, epoch);
    let impact_alt_km = 700.0;
    assert!(initial.rmag_km() - Bodies::Earth.equatorial_radius_km() < impact_alt_km);

    let set = StoppingSet::impact(Bodies::Earth, impact_alt_km).with_close_approaches(1.0e5, false);
    let mut engine = StopEngine::new(set.conditions(), cosm.clone()).unwrap();
    let prop = Propagator::rkf78(OrbitalDynamics::two_body(), PropOpts::default());
    let stopped = prop
        .with(initial, cosm.clone())
        .until_stopped(1.days(), &mut engine)
        .unwrap();
    assert!(stopped.stopped);

    let summary = classify(&stopped.detections, &stopped.final_state, Bodies::Earth, &cosm).unwrap();
    println!("{summary}");

    let impact = &summary.final_event;
    assert_eq!(impact.event_type, EventType::Impact);
    assert!(impact.stopped);
    assert_eq!(impact.distance_type, DistanceType::Altitude);
    assert!((impact.distance_km - impact_alt_km).abs() < 1.0);
    // On the way down of the next revolution
    assert!(impact.epoch > epoch + initial.period() * 0.5);
    assert!(impact.epoch < epoch + initial.period());
    assert!(impact.rel_velocity_km_s.dot(&impact.rel_position_km) < 0.0);

    // The periapsis before the impact is still recorded
    assert_eq!(summary.close_approaches.len(), 1);
    let ca = &summary.close_approaches[0];
    assert_eq!(ca.event_type, EventType::CloseApproach);
    assert!(!ca.stopped);
    assert_eq!(ca.distance_type, DistanceType::Radius);
    assert!((ca.distance_km - RP_KM).abs() < 1.0);
    assert!(ca.epoch < impact.epoch);
}

#[rstest]
fn close_approaches_before_epoch_are_ignored(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let initial = elliptical(-12.0, epoch);
    let prop = Propagator::default(OrbitalDynamics::two_body());

    let mut set = StoppingSet::impact(Bodies::Earth, 700.0).with_close_approaches(1.0e5, true);
    set.stop_after_epoch = Some(epoch + 1.hours());
    let mut engine = StopEngine::new(set.conditions(), cosm.clone()).unwrap();
    let stopped = prop
        .with(initial, cosm.clone())
        .until_stopped(1.days(), &mut engine)
        .unwrap();
    let summary = classify(&stopped.detections, &stopped.final_state, Bodies::Earth, &cosm).unwrap();
    assert!(summary.close_approaches.is_empty());
    assert_eq!(summary.final_event.event_type, EventType::Impact);

    // Without the filter, the close approach stops the propagation first
    set.stop_after_epoch = None;
    let mut engine = StopEngine::new(set.conditions(), cosm.clone()).unwrap();
    let stopped = prop
        .with(initial, cosm.clone())
        .until_stopped(1.days(), &mut engine)
        .unwrap();
    let summary = classify(&stopped.detections, &stopped.final_state, Bodies::Earth, &cosm).unwrap();
    assert_eq!(summary.final_event.event_type, EventType::CloseApproach);
    assert!(summary.final_event.stopped);
    assert_eq!(summary.close_approaches.len(), 1);
    assert!(stopped.final_state.epoch < epoch + 1.hours());
}

#[rstest]
fn continuous_constraint_gates_sampling(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let periapsis = elliptical(0.0, epoch);
    let prop = Propagator::default(OrbitalDynamics::two_body());

    // Apoapsis only counts after the first revolution
    let condition = StopCondition::maximum(StateFunction::Rmag)
        .with_constraint(Constraint::continuous(ConstraintKind::AfterEpoch(
            epoch + periapsis.period(),
        )))
        .stopping();
    let mut engine = StopEngine::new(vec![condition], cosm.clone()).unwrap();
    let stopped = prop
        .with(periapsis, cosm)
        .until_stopped(1.days(), &mut engine)
        .unwrap();
    let detection = stopped.stopped_by().unwrap();
    let expected = epoch + periapsis.period() * 1.5;
    assert!((detection.state.epoch - expected).abs() < 1 * Unit::Second);
    assert!((detection.value - RA_KM).abs() < 1e-3);
}

#[rstest]
fn heliocentric_threshold_precision(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2001, 1, 2);
    let initial = asteroid(epoch);
    let dynamics =
        OrbitalDynamics::from_config(&ForceModelConfig::all_point_masses(), SUN_J2000, cosm.clone())
            .unwrap();
    let prop = Propagator::default(dynamics);

    // The crossing falls in the first steps of the propagation, while they still grow
    let expected = epoch + 30.hours();
    let truth = prop.with(initial, cosm.clone()).until_epoch(expected).unwrap();
    assert!(truth.velocity_km_s[0] > 0.0);

    let condition = StopCondition::new(StateFunction::X, truth.radius_km[0], Trigger::ThresholdIncreasing)
        .with_tolerance(1e-4)
        .with_epoch_precision(10 * Unit::Microsecond)
        .stopping();
    let mut engine = StopEngine::new(vec![condition], cosm.clone()).unwrap();
    let stopped = prop
        .with(initial, cosm)
        .until_stopped(5.days(), &mut engine)
        .unwrap();

    let detection = stopped.stopped_by().unwrap();
    let error = (detection.state.epoch - expected).abs();
    println!("{} detected {error} from {expected}", detection.repr);
    assert!(error < 1 * Unit::Millisecond, "crossing off by {error}");
    assert!((detection.state.radius_km - truth.radius_km).norm() < 0.1);
}

#[rstest]
fn heliocentric_close_approach_precision(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let earth = cosm.celestial_state(Bodies::Earth, epoch, SUN_J2000).unwrap();
    // Flies by the Earth about 1.2 days later, well outside of the atmosphere
    let initial = Orbit::new(
        earth.radius_km + Vector3::new(5.0e5, 2.5e4, 1.0e4),
        earth.velocity_km_s + Vector3::new(-5.0, 0.0, 0.0),
        epoch,
        SUN_J2000,
    );
    let dynamics =
        OrbitalDynamics::from_config(&ForceModelConfig::all_point_masses(), SUN_J2000, cosm.clone())
            .unwrap();
    let prop = Propagator::default(dynamics);

    let condition = StopCondition::minimum(StateFunction::Distance { target: Bodies::Earth })
        .with_epoch_precision(10 * Unit::Microsecond)
        .stopping();
    let mut engine = StopEngine::new(vec![condition], cosm.clone()).unwrap();
    let stopped = prop
        .with(initial, cosm.clone())
        .until_stopped(5.days(), &mut engine)
        .unwrap();
    let detection = stopped.stopped_by().unwrap();
    assert!(detection.state.epoch > epoch + 1.days());
    assert!(detection.state.epoch < epoch + 2.days());

    // Compared to a direct propagation, the range rate vanishes at the detected epoch
    let distance_at = |at: Epoch| -> (f64, f64) {
        let state = prop.with(initial, cosm.clone()).until_epoch(at).unwrap();
        let rel = cosm.try_frame_chg(&state, EARTH_J2000).unwrap();
        (rel.rmag_km(), rel.radius_km.dot(&rel.velocity_km_s) / rel.rmag_km())
    };
    let (distance_km, range_rate_km_s) = distance_at(detection.state.epoch);
    println!(
        "{} at {}: {distance_km:.3} km, range rate {range_rate_km_s:.3e} km/s",
        detection.repr, detection.state.epoch
    );
    assert!((distance_km - detection.value).abs() < 1e-2);
    assert!(range_rate_km_s.abs() < 1e-6);
    assert!(distance_at(detection.state.epoch - 1.minutes()).0 > distance_km);
    assert!(distance_at(detection.state.epoch + 1.minutes()).0 > distance_km);
}
