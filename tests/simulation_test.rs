//! World-level simulation tests
//!
//! Drives full `SimWorld` runs through the library API to validate the
//! tick pipeline: arrivals, car kinematics, signal compliance, retirement,
//! metrics, and baseline persistence.

use signal_sim::simulation::{
    ControlMode, Direction, FixedBaseline, MetricsCollector, Road, SignalController, SignalState,
    SimCar, SimConfig, SimWorld,
};

/// Config with arrivals disabled, for tests that place cars by hand.
fn quiet_config() -> SimConfig {
    SimConfig {
        base_spawn_rate: 0.0,
        ..SimConfig::default()
    }
}

/// A fixed-mode controller advanced into the side-green phase, so the
/// main road faces a red signal.
fn red_main_signal(config: &SimConfig) -> SignalController {
    let mut signal = SignalController::new(ControlMode::Fixed, config.clone(), 0.0);
    signal.update(&[], 26.0, 26.0);
    assert_eq!(signal.state(Road::Main), SignalState::Red);
    signal
}

#[test]
fn config_validation_rejects_degenerate_timing() {
    assert!(SimConfig::default().validate().is_ok());

    let bad_green = SimConfig {
        min_green_time: 50.0,
        max_green_time: 50.0,
        ..SimConfig::default()
    };
    assert!(bad_green.validate().is_err());

    let bad_yellow = SimConfig {
        yellow_time: 0.0,
        ..SimConfig::default()
    };
    assert!(bad_yellow.validate().is_err());

    let bad_world = SimWorld::new(
        ControlMode::Fixed,
        SimConfig {
            fps: 0.0,
            ..SimConfig::default()
        },
    );
    assert!(bad_world.is_err());
}

#[test]
fn signals_never_both_green_during_adaptive_run() {
    let mut world = SimWorld::new_with_seed(ControlMode::Adaptive, SimConfig::default(), 42)
        .expect("valid config");

    for _ in 0..5000 {
        world.tick(0.05);
        assert!(world.signals_mutually_exclusive());
        assert!(world.metrics.total_exited <= world.metrics.total_spawned);
    }

    // Every spawned car is either still on the road or retired.
    assert_eq!(
        world.metrics.total_spawned,
        world.metrics.total_exited + world.cars.len() as u32
    );
    assert!(world.metrics.total_exited > 0, "no cars completed a crossing");
}

#[test]
fn doubling_speed_multiplier_reproduces_the_same_simulation() {
    // Same seed and the same dt_sim per tick, reached through different
    // real-time steps and multipliers.
    let config = SimConfig::default();
    let mut normal =
        SimWorld::new_with_seed(ControlMode::Fixed, config.clone(), 7).expect("valid config");
    let mut doubled = SimWorld::new_with_seed(ControlMode::Fixed, config, 7).expect("valid config");
    doubled.set_speed_multiplier(2.0);

    for _ in 0..500 {
        normal.tick(0.02);
        doubled.tick(0.01);
    }

    assert!((normal.sim_time() - doubled.sim_time()).abs() < 1e-3);
    assert_eq!(normal.metrics.total_spawned, doubled.metrics.total_spawned);
    assert_eq!(normal.cars.len(), doubled.cars.len());

    for (a, b) in normal.cars.iter().zip(doubled.cars.iter()) {
        assert_eq!(a.direction, b.direction);
        assert!((a.x - b.x).abs() < 1e-3, "x diverged: {} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < 1e-3, "y diverged: {} vs {}", a.y, b.y);
    }
}

#[test]
fn waiting_time_accumulates_only_while_stationary() {
    let config = quiet_config();
    let signal = red_main_signal(&config);
    let (cx, cy) = config.center();

    // Parked at the main stop line against a red: waits every step.
    let stop_line = cy + config.intersection_size / 2.0;
    let mut waiting = SimCar::new(cx, stop_line, Direction::North, false, 0.0, &config);
    let mut last_wait = 0.0;
    for _ in 0..10 {
        waiting.update(&[], &signal, &config, 0.1);
        assert!(waiting.waiting_time >= last_wait);
        last_wait = waiting.waiting_time;
    }
    assert!((waiting.waiting_time - 1.0).abs() < 1e-3);
    assert!(waiting.is_stopped);

    // Far from the stop line with open road: moves freely, never waits.
    let mut moving = SimCar::new(cx, cy + 350.0, Direction::North, false, 0.0, &config);
    for _ in 0..10 {
        moving.update(&[], &signal, &config, 0.1);
    }
    assert_eq!(moving.waiting_time, 0.0);
    assert!(moving.speed > 0.0);
    assert!(moving.y < cy + 350.0);
}

#[test]
fn emergency_vehicle_ignores_red_but_not_cars_ahead() {
    let config = quiet_config();
    let signal = red_main_signal(&config);
    let (cx, cy) = config.center();
    let stop_line = cy + config.intersection_size / 2.0;

    // A normal car holds at the red.
    let mut normal = SimCar::new(cx, stop_line, Direction::North, false, 0.0, &config);
    normal.update(&[], &signal, &config, 0.1);
    assert_eq!(normal.speed, 0.0);
    assert!(normal.is_stopped);

    // An emergency vehicle drives straight through.
    let mut ambulance = SimCar::new(cx, stop_line, Direction::North, true, 0.0, &config);
    ambulance.update(&[], &signal, &config, 0.1);
    assert!(ambulance.speed > 0.0);
    assert!(ambulance.y < stop_line);

    // But it still brakes for a car ahead in its lane.
    let blocker = SimCar::new(cx, stop_line - 20.0, Direction::North, false, 0.0, &config);
    let mut held = SimCar::new(cx, stop_line + 10.0, Direction::North, true, 0.0, &config);
    held.update(&[blocker], &signal, &config, 0.1);
    assert_eq!(held.speed, 0.0);
}

#[test]
fn car_follows_nearest_car_ahead_in_lane() {
    let config = quiet_config();
    let signal = SignalController::new(ControlMode::Fixed, config.clone(), 0.0);
    let (cx, cy) = config.center();

    let ahead = SimCar::new(cx, cy + 280.0, Direction::North, false, 0.0, &config);
    let mut follower = SimCar::new(cx, cy + 300.0, Direction::North, false, 0.0, &config);
    follower.speed = 2.0;

    // 20 units behind, inside the 35-unit safe distance: brakes.
    follower.update(&[ahead.clone()], &signal, &config, 0.1);
    assert!(follower.speed < 2.0);

    // A car in the opposite lane or far laterally does not block.
    let opposite = SimCar::new(cx + 100.0, cy + 280.0, Direction::North, false, 0.0, &config);
    let mut free = SimCar::new(cx, cy + 300.0, Direction::North, false, 0.0, &config);
    free.speed = 2.0;
    free.update(&[opposite], &signal, &config, 0.1);
    assert!(free.speed > 2.0);
}

#[test]
fn incident_zone_caps_speed_of_non_emergency_cars() {
    let config = quiet_config();
    let (cx, cy) = config.center();

    let mut world = SimWorld::new(ControlMode::Fixed, config.clone()).expect("valid config");
    world.toggle_incident();
    assert!(world.incident_active());
    world
        .cars
        .push(SimCar::new(cx + 20.0, cy - 70.0, Direction::South, false, 0.0, &config));
    for _ in 0..6 {
        world.tick(0.1);
    }
    assert!(
        world.cars[0].speed <= config.incident_speed_cap + 1e-3,
        "incident should cap speed, got {}",
        world.cars[0].speed
    );

    // The same car without an incident accelerates well past the cap.
    let mut control = SimWorld::new(ControlMode::Fixed, config.clone()).expect("valid config");
    control
        .cars
        .push(SimCar::new(cx + 20.0, cy - 70.0, Direction::South, false, 0.0, &config));
    for _ in 0..6 {
        control.tick(0.1);
    }
    assert!(control.cars[0].speed > config.incident_speed_cap);

    // Emergency vehicles are exempt from the slowdown.
    let mut exempt = SimWorld::new(ControlMode::Fixed, config.clone()).expect("valid config");
    exempt.toggle_incident();
    exempt
        .cars
        .push(SimCar::new(cx + 20.0, cy - 70.0, Direction::South, true, 0.0, &config));
    for _ in 0..6 {
        exempt.tick(0.1);
    }
    assert!(exempt.cars[0].speed > config.incident_speed_cap);
}

#[test]
fn metrics_average_wait_round_trips() {
    let config = quiet_config();
    let mut metrics = MetricsCollector::new(0.0);
    assert_eq!(metrics.average_wait(), 0.0);

    let waits = [3.0_f32, 7.5, 12.0, 0.5];
    for (i, wait) in waits.iter().enumerate() {
        let mut car = SimCar::new(0.0, 0.0, Direction::East, false, 0.0, &config);
        car.waiting_time = *wait;
        metrics.record_exit(&mut car, 10.0 * (i as f32 + 1.0));
        assert_eq!(car.exit_time, Some(10.0 * (i as f32 + 1.0)));
    }

    let expected = waits.iter().sum::<f32>() / waits.len() as f32;
    assert!((metrics.average_wait() - expected).abs() < 1e-4);
    assert_eq!(metrics.total_exited, 4);

    // Exits at t=10..40; only those inside the last minute count.
    assert_eq!(metrics.throughput_per_minute(45.0), 4);
    assert_eq!(metrics.throughput_per_minute(75.0), 3);
    assert_eq!(metrics.throughput_per_minute(200.0), 0);
}

#[test]
fn fixed_run_persists_baseline_and_adaptive_reports_improvement() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = SimConfig {
        base_spawn_rate: 0.0,
        baseline_path: dir.path().join("fixed_metrics.json"),
        ..SimConfig::default()
    };

    // A fixed run writes its snapshot on end.
    let mut fixed = SimWorld::new(ControlMode::Fixed, config.clone()).expect("valid config");
    for _ in 0..20 {
        fixed.tick(0.1);
    }
    let snapshot = fixed.end_run().expect("baseline saved");
    assert!(config.baseline_path.exists());
    assert_eq!(snapshot.total_cars, 0);

    // Seed a meaningful baseline, then run adaptive with half the wait.
    FixedBaseline {
        avg_wait_time: 10.0,
        throughput: 30,
        total_cars: 100,
        simulation_time: 300.0,
    }
    .save(&config.baseline_path)
    .expect("baseline saved");

    let mut adaptive = SimWorld::new(ControlMode::Adaptive, config.clone()).expect("valid config");
    assert_eq!(adaptive.improvement_vs_baseline(), None); // too few exits

    for _ in 0..12 {
        let mut car = SimCar::new(0.0, 0.0, Direction::East, false, 0.0, &config);
        car.waiting_time = 5.0;
        adaptive.metrics.record_exit(&mut car, adaptive.sim_time());
    }
    let improvement = adaptive
        .improvement_vs_baseline()
        .expect("baseline comparison available");
    assert!((improvement - 50.0).abs() < 1e-3);

    // An adaptive run never overwrites the baseline.
    let before = std::fs::read_to_string(&config.baseline_path).expect("baseline readable");
    adaptive.end_run().expect("end adaptive run");
    let after = std::fs::read_to_string(&config.baseline_path).expect("baseline readable");
    assert_eq!(before, after);
}

#[test]
fn baseline_load_tolerates_missing_or_corrupt_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("fixed_metrics.json");

    assert!(FixedBaseline::load(&path).is_none());

    std::fs::write(&path, "not json at all").expect("write");
    assert!(FixedBaseline::load(&path).is_none());

    let baseline = FixedBaseline {
        avg_wait_time: 8.0,
        throughput: 24,
        total_cars: 80,
        simulation_time: 240.0,
    };
    baseline.save(&path).expect("save");
    let loaded = FixedBaseline::load(&path).expect("load");
    assert_eq!(loaded.avg_wait_time, 8.0);
    assert_eq!(loaded.throughput, 24);
    assert_eq!(loaded.total_cars, 80);

    assert_eq!(loaded.improvement_over(4.0), Some(50.0));
    let zero_baseline = FixedBaseline {
        avg_wait_time: 0.0,
        ..loaded
    };
    assert_eq!(zero_baseline.improvement_over(4.0), None);
}

#[test]
fn emergency_spawns_require_emergency_mode() {
    let mut world = SimWorld::new_with_seed(ControlMode::Fixed, SimConfig::default(), 11)
        .expect("valid config");

    // Mode off: no car is ever flagged.
    for _ in 0..2000 {
        world.tick(0.05);
        assert!(world.cars.iter().all(|car| !car.is_emergency));
    }

    // Mode on: emergency vehicles appear among the arrivals.
    world.toggle_emergency_mode();
    let mut saw_emergency = false;
    for _ in 0..5000 {
        world.tick(0.05);
        saw_emergency |= world.cars.iter().any(|car| car.is_emergency);
    }
    assert!(saw_emergency, "no emergency vehicle spawned with mode on");
}

#[test]
fn speed_toggle_flips_between_normal_and_double() {
    let mut world = SimWorld::new(ControlMode::Fixed, SimConfig::default()).expect("valid config");
    assert_eq!(world.speed_multiplier(), 1.0);
    world.toggle_speed();
    assert_eq!(world.speed_multiplier(), 2.0);
    world.toggle_speed();
    assert_eq!(world.speed_multiplier(), 1.0);
}

#[test]
fn start_run_resets_state_but_not_the_clock() {
    let mut world =
        SimWorld::new_with_seed(ControlMode::Fixed, SimConfig::default(), 3).expect("valid config");
    for _ in 0..2000 {
        world.tick(0.05);
    }
    let elapsed = world.sim_time();
    assert!(world.metrics.total_spawned > 0);

    world.start_run(ControlMode::Adaptive);
    assert!(world.cars.is_empty());
    assert_eq!(world.metrics.total_spawned, 0);
    assert_eq!(world.metrics.total_exited, 0);
    // Simulation time is monotonic across runs.
    assert!((world.sim_time() - elapsed).abs() < 1e-3);
    assert_eq!(world.metrics.elapsed(world.sim_time()), 0.0);

    world.tick(0.05);
    assert!(world.signals_mutually_exclusive());
}
