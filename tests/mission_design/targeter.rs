extern crate impactor;

use impactor::cosmic::{BPlane, Bodies, Cosm, Orbit, EARTH_J2000};
use impactor::dynamics::OrbitalDynamics;
use impactor::md::opti::deflection::*;
use impactor::md::opti::objective::TargetParameter;
use impactor::md::{Variable, Vary};
use impactor::propagators::Propagator;
use impactor::time::{Epoch, TimeUnits};
use impactor::ImpactorError;
use rstest::*;
use std::sync::Arc;

#[fixture]
fn cosm() -> Arc<Cosm> {
    crate::test_cosm()
}

/// An incoming hyperbolic flyby of the Earth, 1.5 million km away, which misses it by about 9500 km
fn flyby(epoch: Epoch) -> Orbit {
    Orbit::cartesian(-1.5e6, 2.0e4, 0.0, 5.0, 0.0, 0.0, epoch, EARTH_J2000)
}

#[rstest]
fn apoapsis_burn_to_periapsis_radius(cosm: Arc<Cosm>) {
    // Raising the periapsis with a burn at apoapsis has an analytical solution
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let (rp_km, ra_km) = (7_000.0, 20_000.0);
    let sma = 0.5 * (rp_km + ra_km);
    let ecc = (ra_km - rp_km) / (ra_km + rp_km);
    let apoapsis = Orbit::keplerian(sma, ecc, 28.5, 15.0, 40.0, 180.0, epoch, EARTH_J2000);

    let gm = Bodies::Earth.gm();
    let desired_rp_km = 7_500.0;
    let v_apo = |rp: f64| (2.0 * gm * rp / (ra_km * (ra_km + rp))).sqrt();
    let expected_dv = v_apo(desired_rp_km) - v_apo(rp_km);

    let mut problem = DeflectionProblem::new(desired_rp_km);
    problem.tolerance_km = 0.1;
    problem.variables = vec![Variable::from(Vary::VelocityV)
        .with_max_step(0.02)
        .with_perturbation(1e-5)
        .with_bounds(-0.2, 0.2)];

    let prop = Propagator::default(OrbitalDynamics::two_body());
    let targeter = DeflectionTargeter::new(&prop, cosm, Bodies::Earth, 1.days(), problem);
    let solution = targeter.solve(apoapsis).unwrap();
    println!("{solution}");

    // The nominal encounter is the periapsis, and an ellipse has no B-Plane stage
    assert!((solution.nominal.distance_km - rp_km).abs() < 1e-3);
    assert!(solution.nominal.b_plane.is_none());
    assert_eq!(solution.stages.len(), 1);
    let stage = &solution.stages[0];
    assert_eq!(stage.achieved_objectives[0].parameter, TargetParameter::ClosestApproach);
    assert!(stage.iterations <= 10);

    let mnvr = solution.maneuver.unwrap();
    assert_eq!(mnvr.frame, ManeuverFrame::Vnc);
    assert_eq!(mnvr.epoch, epoch);
    assert!(
        (mnvr.dv_km_s[0] - expected_dv).abs() < 5e-5,
        "Δv of {} km/s instead of {expected_dv} km/s",
        mnvr.dv_km_s[0]
    );
    let achieved = solution.achieved.unwrap();
    assert!((achieved.distance_km - desired_rp_km).abs() <= 0.1);
}

#[rstest]
fn two_stage_flyby_deflection(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let incoming = flyby(epoch);

    let mut problem = DeflectionProblem::new(15_000.0);
    problem.variables = vec![Variable::from(Vary::VelocityC).with_max_step(0.01)];

    let prop = Propagator::default(OrbitalDynamics::two_body());
    let targeter = DeflectionTargeter::new(&prop, cosm, Bodies::Earth, 10.days(), problem);
    let solution = targeter.solve(incoming).unwrap();
    println!("{solution}");

    // Two body: the nominal closest approach is the periapsis of the hyperbola
    let rp_km = incoming.sma_km() * (1.0 - incoming.ecc());
    assert!((solution.nominal.distance_km - rp_km).abs() < 0.1);
    assert!(solution.nominal.b_plane.is_some());

    assert_eq!(solution.stages.len(), 2);
    assert_eq!(solution.stages[0].achieved_objectives[0].parameter, TargetParameter::BMag);
    assert_eq!(
        solution.stages[1].achieved_objectives[0].parameter,
        TargetParameter::ClosestApproach
    );
    // The second stage starts from the first stage solution
    assert_eq!(
        solution.stages[1].history[0].variables,
        solution.stages[0].correction
    );

    let achieved = solution.achieved.unwrap();
    assert!((achieved.distance_km - 15_000.0).abs() <= 1.0);
    let b_plane = BPlane::new(achieved.rel_state).unwrap();
    assert!(b_plane.mag() > solution.nominal.b_plane.unwrap().mag());
}

#[rstest]
fn nominal_only(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    let mut problem = DeflectionProblem::new(15_000.0);
    problem.run_nominal_only = true;

    let prop = Propagator::default(OrbitalDynamics::two_body());
    let targeter = DeflectionTargeter::new(&prop, cosm, Bodies::Earth, 10.days(), problem);
    let solution = targeter.solve(flyby(epoch)).unwrap();
    assert!(solution.maneuver.is_none());
    assert!(solution.stages.is_empty());
    assert!(solution.achieved.is_none());
}

#[rstest]
fn unreachable_target_is_a_convergence_failure(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2020, 1, 1);
    // One iteration with tiny steps cannot move the flyby by 50 000 km
    let mut problem = DeflectionProblem::new(60_000.0);
    problem.max_iterations = 1;
    problem.variables = vec![Variable::from(Vary::VelocityC).with_max_step(1e-5)];

    let prop = Propagator::default(OrbitalDynamics::two_body());
    let targeter = DeflectionTargeter::new(&prop, cosm, Bodies::Earth, 10.days(), problem);
    let err = targeter.solve(flyby(epoch)).unwrap_err();
    assert!(matches!(err, ImpactorError::ConvergenceFailure { .. }));
    assert!(!err.is_input_error());

    // No encounter within the maximum duration
    let prop = Propagator::default(OrbitalDynamics::two_body());
    let targeter = DeflectionTargeter::new(
        &prop,
        crate::test_cosm(),
        Bodies::Earth,
        1.days(),
        DeflectionProblem::new(15_000.0),
    );
    assert!(matches!(
        targeter.solve(flyby(epoch)),
        Err(ImpactorError::PropagationFailure { .. })
    ));
}
