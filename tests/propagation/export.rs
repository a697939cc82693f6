extern crate impactor;

use super::asteroid;
use impactor::cosmic::{Cosm, SUN_J2000};
use impactor::dynamics::{ForceModelConfig, OrbitalDynamics};
use impactor::md::trajectory::{sample, TrajError};
use impactor::propagators::Propagator;
use impactor::time::{Duration, Epoch, TimeUnits, Unit};
use impactor::ImpactorError;
use rstest::*;
use std::sync::Arc;

#[fixture]
fn cosm() -> Arc<Cosm> {
    crate::test_cosm()
}

#[rstest]
fn export_grid_and_raw(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2001, 1, 2);
    let initial = asteroid(epoch);
    let dynamics =
        OrbitalDynamics::from_config(&ForceModelConfig::all_point_masses(), SUN_J2000, cosm.clone())
            .unwrap();
    let prop = Propagator::default(dynamics);
    let end = epoch + 10.days() + 7.hours();
    let (_, traj) = prop
        .with(initial, cosm.clone())
        .until_epoch_with_traj(end)
        .unwrap();

    // Uniform grid: the end epoch is appended even if it's not on the grid
    let step = 1 * Unit::Day;
    let grid = sample(&traj, epoch, end, step).unwrap();
    assert_eq!(grid.len(), 12);
    assert_eq!(grid[0].epoch, epoch);
    assert_eq!(grid[10].epoch, epoch + 10.days());
    assert_eq!(grid[11].epoch, end);

    // The interpolated states match a direct propagation
    for state in grid.iter().skip(1).step_by(3) {
        let direct = prop
            .with(initial, cosm.clone())
            .until_epoch(state.epoch)
            .unwrap();
        let dr = (direct.radius_km - state.radius_km).norm();
        assert!(dr < 1e-2, "interpolation error of {dr} km at {}", state.epoch);
    }

    // A positive step cannot sample backward
    let err = sample(&traj, end, epoch, step).unwrap_err();
    assert!(matches!(err, TrajError::StepDirection { .. }));
    let err: ImpactorError = err.into();
    assert!(matches!(err, ImpactorError::InvalidConfiguration { .. }));

    // No step: the raw integrator states, in the order of the window
    let raw = sample(&traj, epoch, end, Duration::ZERO).unwrap();
    assert_eq!(raw.len(), traj.len());
    assert_eq!(raw, traj.states);
    let reversed = sample(&traj, end, epoch, Duration::ZERO).unwrap();
    assert_eq!(reversed.first().unwrap().epoch, end);
    assert_eq!(reversed.last().unwrap().epoch, epoch);
}

/// The first steps of a heliocentric propagation grow from a minute to a day: the interpolation must hold across them.
#[rstest]
fn interpolation_over_growing_steps(cosm: Arc<Cosm>) {
    let epoch = Epoch::from_gregorian_tai_at_midnight(2001, 1, 2);
    let initial = asteroid(epoch);
    let dynamics =
        OrbitalDynamics::from_config(&ForceModelConfig::all_point_masses(), SUN_J2000, cosm.clone())
            .unwrap();
    let prop = Propagator::default(dynamics);
    let (_, traj) = prop
        .with(initial, cosm.clone())
        .for_duration_with_traj(3.days())
        .unwrap();

    let steps: Vec<f64> = traj
        .states
        .windows(2)
        .map(|w| (w[1].epoch - w[0].epoch).to_seconds())
        .collect();
    println!("first steps (s): {:?}", &steps[..steps.len().min(6)]);
    assert!(steps[0] < 600.0);
    assert!(steps.iter().any(|h| *h > 20.0 * steps[0]));

    let offsets = [
        30.seconds(),
        5.minutes(),
        1.hours(),
        7.hours(),
        18.hours(),
        1.days(),
        30.hours(),
        2.days(),
        2.days() + 11.hours(),
    ];
    for offset in offsets {
        let interp = traj.at(epoch + offset).unwrap();
        let direct = prop
            .with(initial, cosm.clone())
            .for_duration(offset)
            .unwrap();
        let dr = (direct.radius_km - interp.radius_km).norm();
        let dv = (direct.velocity_km_s - interp.velocity_km_s).norm();
        println!("{offset}: {dr:.3e} km, {dv:.3e} km/s");
        assert!(dr < 1e-2, "position error of {dr} km after {offset}");
        assert!(dv < 1e-8, "velocity error of {dv} km/s after {offset}");
    }
}
