extern crate impactor;

use impactor::cosmic::{Bodies, Cosm};
use impactor::io::scenario::ScenarioConfig;
use impactor::io::{ConfigError, ConfigRepr};
use impactor::md::analysis::ImpactAnalysis;
use impactor::md::events::{DistanceType, EventType};
use impactor::time::{Epoch, TimeUnits};
use impactor::ImpactorError;
use rstest::*;
use std::str::FromStr;
use std::sync::Arc;

#[fixture]
fn cosm() -> Arc<Cosm> {
    crate::test_cosm()
}

const FLYBY: &str = r#"
state:
    epoch: 2020-01-01T00:00:00 TAI
    frame:
        center: Earth
        orientation: J2000
    position_km: [-1.5e6, 2.0e4, 0.0]
    velocity_km_s: [5.0, 0.0, 0.0]
forces:
    bodies:
        Earth: POINT_MASS
max_duration: 10 days
output_step_s: 3600.0
stopping:
    target: Earth
    enable_close_approach: true
    close_approach_radius_km: 1.0e5
    stop_on_close_approach: true
    impact_altitude_km: 0.0
targeting:
    target_distance_km: 15000.0
    tolerance_km: 1.0
    variables:
        - component: VelocityC
          max_step: 0.01
"#;

#[rstest]
fn flyby_scenario(cosm: Arc<Cosm>) {
    let config = ScenarioConfig::loads(FLYBY).unwrap();
    let analysis = ImpactAnalysis::from_config(config, cosm).unwrap();
    let result = analysis.run().unwrap();
    println!("{result}");

    let events = result.events.unwrap();
    assert_eq!(events.final_event.event_type, EventType::CloseApproach);
    assert!(events.final_event.stopped);
    assert_eq!(events.final_event.distance_type, DistanceType::Radius);
    assert_eq!(events.close_approaches.len(), 1);
    assert_eq!(result.final_state.epoch, events.final_event.epoch);

    // Hourly ephemeris until the close approach, which is the last sample
    assert_eq!(result.ephemeris.last().unwrap().epoch, result.final_state.epoch);
    for pair in result.ephemeris.windows(2).take(result.ephemeris.len() - 2) {
        assert_eq!(pair[1].epoch - pair[0].epoch, 1.hours());
    }

    let deflection = result.deflection.unwrap();
    assert!((deflection.nominal.distance_km - events.final_event.distance_km).abs() < 1e-3);
    assert!((deflection.achieved.unwrap().distance_km - 15_000.0).abs() <= 1.0);
}

#[rstest]
fn nominal_only_scenario(cosm: Arc<Cosm>) {
    let mut config = ScenarioConfig::loads(FLYBY).unwrap();
    if let Some(problem) = config.targeting.as_mut() {
        problem.run_nominal_only = true;
    }
    config.output_step_s = 0.0;
    let result = ImpactAnalysis::from_config(config, cosm)
        .unwrap()
        .run()
        .unwrap();
    // Raw states of the integrator
    assert_eq!(result.ephemeris.len(), result.traj.len());
    let deflection = result.deflection.unwrap();
    assert!(deflection.maneuver.is_none());
}

#[rstest]
fn invalid_scenarios_are_input_errors(cosm: Arc<Cosm>) {
    let base = ScenarioConfig::loads(FLYBY).unwrap();

    let mut no_max = base.clone();
    no_max.max_duration = None;
    no_max.end = Some(no_max.state.epoch + 10.days());

    let mut negative_target = base.clone();
    if let Some(problem) = negative_target.targeting.as_mut() {
        problem.target_distance_km = 0.0;
    }

    let mut mismatch = base.clone();
    mismatch.end = Some(mismatch.state.epoch - 1.days());

    let mut unknown_asteroid = base.clone();
    unknown_asteroid.forces = unknown_asteroid.forces.clone().with_asteroid("Apophis 2");

    let mut omitted_center = base.clone();
    omitted_center.forces.bodies.remove(&Bodies::Earth);

    let mut out_of_span = base;
    out_of_span.state.epoch = Epoch::from_str("2050-12-25T00:00:00 TAI").unwrap();

    for config in [
        no_max,
        negative_target,
        mismatch,
        unknown_asteroid,
        omitted_center,
        out_of_span,
    ] {
        let err = ImpactAnalysis::from_config(config, cosm.clone()).err().unwrap();
        println!("{err}");
        assert!(err.is_input_error());
    }
}

#[test]
fn malformed_yaml() {
    assert!(matches!(
        ScenarioConfig::loads("state: 12"),
        Err(ConfigError::ParseError { .. })
    ));
    assert!(matches!(
        ScenarioConfig::load("/does/not/exist.yaml"),
        Err(ConfigError::ReadError { .. })
    ));
    let err: ImpactorError = ScenarioConfig::loads(&FLYBY.replace("POINT_MASS", "FULL"))
        .unwrap_err()
        .into();
    assert!(matches!(err, ImpactorError::InvalidConfiguration { .. }));
}

#[test]
fn load_many_scenarios() {
    // Both scenarios as items of a YAML sequence
    let as_item = |yaml: &str| -> String {
        yaml.trim()
            .lines()
            .enumerate()
            .map(|(i, line)| if i == 0 { format!("- {line}") } else { format!("  {line}") })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let shorter = FLYBY.replace("max_duration: 10 days", "max_duration: 2 days");
    let path = std::env::temp_dir().join(format!("impactor-scenarios-{}.yaml", std::process::id()));
    std::fs::write(&path, format!("{}\n{}\n", as_item(FLYBY), as_item(&shorter))).unwrap();

    let configs = ScenarioConfig::load_many(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0], ScenarioConfig::loads(FLYBY).unwrap());
    assert_eq!(configs[1].max_duration, Some(2.days()));
    assert_eq!(configs[1].state, configs[0].state);
}

/// The 2001 reference asteroid reaches 500 km above the Earth ten years later, with the DE440s ephemerides.
#[test]
fn reference_impact_scenario() {
    let cosm = crate::test_almanac_cosm();
    let config = ScenarioConfig::loads(
        r#"
state:
    epoch: 2001-01-02T01:13:46.620000 UTC
    position_km: [-150874809.2, -187234595.3, -73785026.7]
    velocity_km_s: [14.64403935, -11.75744819, -5.583528281]
forces:
    bodies:
        Sun: POINT_MASS
        Mercury: POINT_MASS
        Venus: POINT_MASS
        Earth: POINT_MASS
        Moon: POINT_MASS
        Mars: POINT_MASS
        Jupiter: POINT_MASS
        Saturn: POINT_MASS
        Uranus: POINT_MASS
        Neptune: POINT_MASS
        Pluto: POINT_MASS
max_duration: 3653 days
stopping:
    target: Earth
    impact_altitude_km: 500.0
    stop_on_impact: true
"#,
    )
    .unwrap();

    let result = ImpactAnalysis::from_config(config, cosm)
        .unwrap()
        .run()
        .unwrap();
    let impact = result.events.unwrap().final_event;
    assert_eq!(impact.event_type, EventType::Impact);
    let expected = Epoch::from_str("2010-12-31T01:13:46.620000 UTC").unwrap();
    assert!((impact.epoch - expected).abs() < 6.hours());
    assert!((impact.distance_km - 500.0).abs() < 1.0);
}
