use bottleneck_control::{
    backend::{MemorySimulator, SimError, DEFAULT_COLOR, DEFAULT_LANE_CHANGE_MODE},
    config::ControlConfig,
    simulation::{BottleneckController, Color, LaneChangeMode, LaneStatus, VehicleId},
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOLL_HIGHLIGHT: Color = Color::new(255, 0, 255, 0);

fn toll_only(lanes: usize) -> ControlConfig {
    let mut config = ControlConfig::default();
    config.toll.lanes = lanes;
    config.ramp.disabled = true;
    config
}

fn controller(config: &ControlConfig, sim: &MemorySimulator) -> BottleneckController<StdRng> {
    BottleneckController::new(config, sim, StdRng::seed_from_u64(12345)).unwrap()
}

fn signal(report: &bottleneck_control::simulation::StepReport) -> &str {
    report.toll.as_ref().unwrap().signal.as_str()
}

/// One vehicle through the plaza: locked, held for five steps, released.
#[test]
fn single_vehicle_is_held_for_its_service_time() {
    let config = toll_only(2);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    let id = sim.spawn("veh0", "1", 0, 5.0);

    let report = controller.step(&mut sim).unwrap();
    assert_eq!(signal(&report), "GG");
    assert!(report.toll.as_ref().unwrap().signal_pushed);
    assert_eq!(sim.vehicle(&id).unwrap().lane_change_mode, DEFAULT_LANE_CHANGE_MODE);

    // past the booth area: lane changes locked
    sim.place(&id, "1", 0, 20.0);
    let report = controller.step(&mut sim).unwrap();
    assert_eq!(report.toll.as_ref().unwrap().acquired, vec![id.clone()]);
    assert_eq!(sim.vehicle(&id).unwrap().lane_change_mode, LaneChangeMode::LOCKED);
    assert_eq!(sim.vehicle(&id).unwrap().color, TOLL_HIGHLIGHT);

    controller.toll_mut().unwrap().set_timer(0, 5.0);
    sim.place(&id, "1", 0, 60.0);

    for step in 0..5 {
        let report = controller.step(&mut sim).unwrap();
        let toll = report.toll.as_ref().unwrap();
        assert_eq!(toll.signal.as_str(), "rG", "step {}", step);
        assert_eq!(toll.lanes[0], LaneStatus::Queued);
        assert_eq!(toll.signal_pushed, step == 0);
    }
    assert_eq!(controller.toll().unwrap().timer(0), Some(0.0));

    let report = controller.step(&mut sim).unwrap();
    assert_eq!(signal(&report), "GG");
    assert_eq!(report.toll.as_ref().unwrap().lanes[0], LaneStatus::Releasing);

    // through the booth
    sim.place(&id, "2", 0, 1.0);
    let report = controller.step(&mut sim).unwrap();
    assert_eq!(report.toll.as_ref().unwrap().released, vec![id.clone()]);
    let vehicle = sim.vehicle(&id).unwrap();
    assert_eq!(vehicle.lane_change_mode, DEFAULT_LANE_CHANGE_MODE);
    assert_eq!(vehicle.color, DEFAULT_COLOR);
    assert!(!controller.toll().unwrap().suppression().is_suppressed(&id));

    let redrawn = controller.toll().unwrap().timer(0).unwrap();
    assert!(redrawn > 0.0, "lane 0 timer redrawn to {}", redrawn);

    // initial GG, rG, back to GG
    assert_eq!(sim.signal_writes("2"), 3);
    assert_eq!(sim.signal_state("2").map(|s| s.as_str()), Some("GG"));
}

#[test]
fn lanes_are_concatenated_in_index_order() {
    let config = toll_only(2);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    let a = sim.spawn("a", "1", 0, 20.0);
    let b = sim.spawn("b", "1", 1, 20.0);

    controller.step(&mut sim).unwrap();
    let toll = controller.toll_mut().unwrap();
    toll.set_timer(0, 0.0);
    toll.set_timer(1, 3.0);

    sim.place(&a, "1", 0, 55.0);
    sim.place(&b, "1", 1, 55.0);
    let report = controller.step(&mut sim).unwrap();
    let toll = report.toll.unwrap();
    assert_eq!(toll.signal.as_str(), "Gr");
    assert_eq!(toll.lanes, vec![LaneStatus::Releasing, LaneStatus::Queued]);
    assert_eq!(controller.toll().unwrap().timer(1), Some(2.0));
}

#[test]
fn newly_locked_vehicle_is_not_metered_on_the_same_step() {
    let config = toll_only(1);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    sim.spawn("late", "1", 0, 70.0);
    controller.toll_mut().unwrap().set_timer(0, 2.0);

    let report = controller.step(&mut sim).unwrap();
    assert_eq!(signal(&report), "G");
    assert_eq!(controller.toll().unwrap().timer(0), Some(2.0));

    let report = controller.step(&mut sim).unwrap();
    assert_eq!(signal(&report), "r");
}

#[test]
fn vehicle_between_thresholds_keeps_lane_open() {
    let config = toll_only(1);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    let id = sim.spawn("v", "1", 0, 30.0);
    controller.toll_mut().unwrap().set_timer(0, 4.0);

    for _ in 0..3 {
        let report = controller.step(&mut sim).unwrap();
        assert_eq!(signal(&report), "G");
    }
    assert!(controller.toll().unwrap().suppression().is_suppressed(&id));
    assert_eq!(controller.toll().unwrap().timer(0), Some(4.0));
}

#[test]
fn unchanged_occupancy_is_written_once() {
    let config = toll_only(4);
    let mut sim = MemorySimulator::new(0.5).with_signal("2");
    let mut controller = controller(&config, &sim);
    sim.spawn("short", "1", 0, 3.0);
    sim.spawn("downstream", "4", 2, 40.0);

    for _ in 0..25 {
        controller.step(&mut sim).unwrap();
    }
    assert_eq!(sim.signal_writes("2"), 1);
    assert_eq!(controller.toll().unwrap().signal_state().as_str(), "GGGG");
}

#[test]
fn held_queue_does_not_rewrite_signal() {
    let config = toll_only(3);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    sim.spawn("held", "1", 2, 90.0);
    controller.toll_mut().unwrap().set_timer(2, 1_000.0);

    for _ in 0..30 {
        controller.step(&mut sim).unwrap();
    }
    // GGG then GGr, nothing after
    assert_eq!(sim.signal_writes("2"), 2);
    assert_eq!(sim.signal_state("2").map(|s| s.as_str()), Some("GGr"));
}

#[test]
fn signal_string_tracks_lane_count_and_alphabet() {
    let config = toll_only(16);
    let mut sim = MemorySimulator::new(0.5).with_signal("2");
    let mut controller = controller(&config, &sim);
    let mut rng = StdRng::seed_from_u64(99);
    let edges = ["1", "1", "2", "3"];

    let ids: Vec<VehicleId> = (0..40).map(|i| sim.spawn(&format!("v{}", i), "1", 0, 0.0)).collect();
    let mut previous = String::new();
    let mut writes = 0;

    for _ in 0..300 {
        for id in &ids {
            if rng.gen_bool(0.3) {
                let edge = edges[rng.gen_range(0..edges.len())];
                sim.place(id, edge, rng.gen_range(0..16), rng.gen_range(0.0..100.0));
            }
        }

        let report = controller.step(&mut sim).unwrap();
        let toll = report.toll.unwrap();
        assert_eq!(toll.signal.len(), 16);
        assert!(toll.signal.as_str().chars().all(|c| c == 'G' || c == 'r'));
        assert_eq!(toll.signal_pushed, toll.signal.as_str() != previous);
        if toll.signal_pushed {
            writes += 1;
        }
        previous = toll.signal.as_str().to_string();

        for lane in 0..16 {
            assert!(controller.toll().unwrap().timer(lane).is_some());
        }
    }

    assert_eq!(sim.signal_writes("2"), writes);
}

#[test]
fn fast_track_lane_redraws_from_fast_track_mean() {
    let config = toll_only(16);
    let mut sim = MemorySimulator::new(0.1).with_signal("2");
    let mut controller = controller(&config, &sim);
    let fast = sim.spawn("fast", "1", 8, 20.0);
    let slow = sim.spawn("slow", "1", 0, 20.0);

    controller.step(&mut sim).unwrap();
    sim.place(&fast, "2", 8, 1.0);
    sim.place(&slow, "2", 0, 1.0);
    controller.step(&mut sim).unwrap();

    // fast track: 3s / 0.1 = 30 steps, normal lanes: 15s / 0.1 = 150 steps
    let toll = controller.toll().unwrap();
    let fast_timer = toll.timer(8).unwrap();
    let slow_timer = toll.timer(0).unwrap();
    assert!((0.0..90.0).contains(&fast_timer), "fast track timer {}", fast_timer);
    assert!((90.0..210.0).contains(&slow_timer), "normal timer {}", slow_timer);
}

#[test]
fn initial_timers_are_drawn_for_every_lane() {
    let config = toll_only(16);
    let sim = MemorySimulator::new(0.5);
    let controller = controller(&config, &sim);
    let toll = controller.toll().unwrap();

    assert_eq!(toll.lanes(), 16);
    assert!(toll.signal_state().is_empty());
    for lane in 0..16 {
        assert!(toll.timer(lane).unwrap() >= 0.0);
    }
    assert_eq!(toll.timer(16), None);
}

#[test]
fn vanished_vehicle_leaks_record_and_timer() {
    let config = toll_only(2);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    let id = sim.spawn("gone", "1", 1, 60.0);

    controller.step(&mut sim).unwrap();
    controller.toll_mut().unwrap().set_timer(1, 7.0);
    sim.remove_vehicle(&id);

    for _ in 0..5 {
        let report = controller.step(&mut sim).unwrap();
        assert!(report.toll.unwrap().released.is_empty());
    }
    let toll = controller.toll().unwrap();
    assert!(toll.suppression().is_suppressed(&id));
    assert_eq!(toll.timer(1), Some(7.0));
}

#[test]
fn release_restores_custom_settings() {
    let config = toll_only(2);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    let id = sim.spawn("custom", "1", 1, 15.0);
    {
        let vehicle = sim.vehicle_mut(&id).unwrap();
        vehicle.lane_change_mode = LaneChangeMode(256);
        vehicle.color = Color::new(10, 20, 30, 255);
    }

    controller.step(&mut sim).unwrap();
    sim.place(&id, "1", 1, 25.0);
    controller.step(&mut sim).unwrap();
    assert_eq!(controller.toll().unwrap().suppression().len(), 1);
    assert_eq!(
        controller.toll().unwrap().suppression().saved_state(&id).map(|s| s.lane_change_mode),
        Some(LaneChangeMode(256))
    );

    sim.place(&id, "2", 1, 2.0);
    controller.step(&mut sim).unwrap();
    let vehicle = sim.vehicle(&id).unwrap();
    assert_eq!(vehicle.lane_change_mode, LaneChangeMode(256));
    assert_eq!(vehicle.color, Color::new(10, 20, 30, 255));
}

#[test]
fn disabled_toll_never_touches_the_signal() {
    let mut config = toll_only(2);
    config.toll.disabled = true;
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    sim.spawn("v", "1", 0, 70.0);

    let report = controller.step(&mut sim).unwrap();
    assert!(report.toll.is_none());
    assert!(controller.toll().is_none());
    assert!(sim.commands().is_empty());
}

#[test]
fn simulator_fault_aborts_the_step() {
    let config = toll_only(2);
    let mut sim = MemorySimulator::new(1.0);
    let mut controller = controller(&config, &sim);

    match controller.step(&mut sim) {
        Err(SimError::UnknownSignal(id)) => assert_eq!(id, "2"),
        other => panic!("expected unknown signal, got {:?}", other.map(|r| r.step)),
    }
    assert!(controller.toll().unwrap().signal_state().is_empty());

    // the failed push is retried once the light exists
    sim.add_signal("2");
    let report = controller.step(&mut sim).unwrap();
    assert_eq!(report.step, 0);
    assert!(report.toll.as_ref().unwrap().signal_pushed);
    assert_eq!(sim.signal_writes("2"), 1);
    assert_eq!(controller.toll().unwrap().signal_state().as_str(), "GG");

    controller.step(&mut sim).unwrap();
    assert_eq!(sim.signal_writes("2"), 1);
}

#[test]
fn vehicle_exactly_at_metering_distance_is_not_metered() {
    let config = toll_only(1);
    let mut sim = MemorySimulator::new(1.0).with_signal("2");
    let mut controller = controller(&config, &sim);
    let id = sim.spawn("boundary", "1", 0, 50.0);

    controller.step(&mut sim).unwrap();
    assert!(controller.toll().unwrap().suppression().is_suppressed(&id));
    controller.toll_mut().unwrap().set_timer(0, 3.0);

    let report = controller.step(&mut sim).unwrap();
    assert_eq!(signal(&report), "G");
    assert_eq!(report.toll.as_ref().unwrap().lanes[0], LaneStatus::Free);
    assert_eq!(controller.toll().unwrap().timer(0), Some(3.0));

    sim.place(&id, "1", 0, 50.5);
    let report = controller.step(&mut sim).unwrap();
    assert_eq!(signal(&report), "r");
    assert_eq!(controller.toll().unwrap().timer(0), Some(2.0));
}

#[test]
fn service_times_use_the_simulator_step_length() {
    let config = toll_only(2);
    let mut sim = MemorySimulator::new(0.1).with_signal("2");
    let mut controller = controller(&config, &sim);
    let id = sim.spawn("v", "1", 0, 20.0);

    controller.step(&mut sim).unwrap();
    assert!(controller.toll().unwrap().suppression().is_suppressed(&id));
    sim.place(&id, "2", 0, 1.0);
    let report = controller.step(&mut sim).unwrap();
    assert_eq!(report.toll.as_ref().unwrap().released, vec![id]);

    // 15s at 0.1s per step
    let redrawn = controller.toll().unwrap().timer(0).unwrap();
    assert!((100.0..200.0).contains(&redrawn), "lane 0 timer redrawn to {}", redrawn);
}

#[test]
fn non_positive_step_length_is_rejected() {
    let config = toll_only(2);
    let sim = MemorySimulator::new(0.0).with_signal("2");
    assert!(BottleneckController::new(&config, &sim, StdRng::seed_from_u64(1)).is_err());
}
