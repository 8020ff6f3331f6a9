mod common;

use urban_traffic_sim::error::SimError;
use urban_traffic_sim::network::{Direction, LinkSpec, NetworkGraph, NodeId};
use urban_traffic_sim::runner::{compare_signal_modes, run_scenario};
use urban_traffic_sim::scenario::Scenario;
use urban_traffic_sim::sim::signal::{SignalMode, SignalPhase};
use urban_traffic_sim::sim::types::SimConfig;

const SPEED_LIMIT_MPS: f64 = 13.9;

#[test]
fn default_run_holds_tick_invariants() {
    let cfg = common::small_config();
    let mut engine = Scenario::from_config(&cfg).expect("scenario").into_engine();
    let total = cfg.simulation.vehicles;

    let mut prev_delay = vec![0.0; total];
    let mut prev_travel = vec![0.0; total];

    while let Some(record) = engine.step().expect("tick") {
        assert_eq!(
            record.completed_count + record.in_network,
            total,
            "conservation broken at tick {}",
            record.tick
        );
        if record.in_network > 0 {
            assert!(record.emissions_delta_g > 0.0, "tick {}", record.tick);
        }

        for signal in engine.state().signals() {
            let ns = signal.can_pass(Direction::NorthSouth);
            let ew = signal.can_pass(Direction::EastWest);
            assert!(!(ns && ew), "both phases open at {}", signal.node());
            if signal.phase() == SignalPhase::Yellow {
                assert!(!ns && !ew);
            }
            let green = signal.state().green_duration_s;
            assert!((15.0..=90.0).contains(&green), "green {green} out of bounds");
        }

        for v in engine.state().vehicles() {
            let id = v.id();
            assert!(v.delay_s() >= prev_delay[id]);
            assert!(v.travel_time_s() >= prev_travel[id]);
            assert!(v.delay_s() <= v.travel_time_s());
            assert!(v.speed_mps() <= SPEED_LIMIT_MPS);
            prev_delay[id] = v.delay_s();
            prev_travel[id] = v.travel_time_s();
        }
    }

    let report = engine.report();
    assert_eq!(report.total_vehicles, total);
    assert!(report.completed_vehicles > 0);
    assert!(report.total_emissions_kg > 0.0);
}

#[test]
fn runs_are_deterministic_per_seed() {
    let cfg = common::small_config();
    let a = run_scenario(&cfg).expect("first run");
    let b = run_scenario(&cfg).expect("second run");
    assert_eq!(a.records, b.records);
    assert_eq!(a.vehicles, b.vehicles);
    assert_eq!(a.report, b.report);

    let mut other = cfg.clone();
    other.simulation.seed = 8;
    let c = run_scenario(&other).expect("reseeded run");
    assert_ne!(a.vehicles, c.vehicles);
}

#[test]
fn shortest_routes_match_manhattan_distance() {
    let cfg = common::shortest_config();
    let scenario = Scenario::from_config(&cfg).expect("scenario");
    for v in scenario.vehicles() {
        let hops = v.route().len() - 1;
        let expected = scenario.network().manhattan_distance(v.origin(), v.destination());
        assert_eq!(hops, expected as usize, "vehicle {}", v.id());
        assert_ne!(v.origin(), v.destination());
    }
}

#[test]
fn lone_adaptive_vehicle_clears_without_delay() {
    let scenario = common::routed_scenario(
        vec![vec![NodeId(0, 0), NodeId(0, 1)]],
        SignalMode::Adaptive,
        200,
    );
    let mut engine = scenario.into_engine();

    let first = engine.step().expect("tick").expect("record");
    assert_eq!(first.queue_lengths[0], 1);
    assert_eq!(engine.state().signals()[0].state().green_duration_s, 90.0);

    let report = engine.run().expect("run");
    assert_eq!(report.completed_vehicles, 1);
    assert_eq!(report.avg_delay_s, 0.0);
}

#[test]
fn fixed_time_vehicle_waits_out_the_cross_phase() {
    // EW hop first, then NS: held 18 s at each node by the 15 s green + 3 s
    // yellow of the opposing phase.
    let scenario = common::routed_scenario(
        vec![vec![NodeId(0, 0), NodeId(1, 0), NodeId(1, 1)]],
        SignalMode::Fixed,
        500,
    );
    let mut engine = scenario.into_engine();
    engine.run().expect("run");

    let v = &engine.state().vehicles()[0];
    assert!(v.is_completed());
    assert_eq!(v.delay_s(), 36.0);
    assert_eq!(v.completed_tick(), Some(108));
    assert_eq!(v.distance_m(), 1000.0);
    assert!(v.delay_s() <= v.travel_time_s());
}

#[test]
fn fixed_time_arrival_just_after_ns_green_waits_for_the_next_ns_phase() {
    // 16-tick links: the NS mover reaches (0, 1) on tick 15 and first asks
    // to leave on tick 16, one tick into the yellow that ends NS green.
    // It waits out 2 s of yellow, 15 s of EW green and 3 s of yellow.
    let link = LinkSpec {
        length_m: 160.0,
        speed_limit_mps: 10.0,
    };
    let network = NetworkGraph::new(3, 1000.0, link).expect("3x3 grid");
    let mut config = SimConfig::new(200, 1.0, 42);
    config.signal_mode = SignalMode::Fixed;
    let route = vec![NodeId(0, 0), NodeId(0, 1), NodeId(0, 2)];
    let mut engine = Scenario::from_routes(config, network, vec![route])
        .expect("scenario")
        .into_engine();

    for _ in 0..16 {
        engine.step().expect("tick");
    }
    let v = &engine.state().vehicles()[0];
    assert_eq!(v.position(), NodeId(0, 1));
    assert_eq!(v.delay_s(), 0.0);
    assert_eq!(engine.state().signals()[1].phase(), SignalPhase::Yellow);

    engine.run().expect("run");
    let v = &engine.state().vehicles()[0];
    assert_eq!(v.delay_s(), 20.0);
    // departs on tick 36 when NS opens again, arrives on tick 51
    assert_eq!(v.completed_tick(), Some(52));
    assert_eq!(v.travel_time_s(), 52.0);
}

#[test]
fn comparison_uses_identical_demand() {
    let cfg = common::small_config();
    let cmp = compare_signal_modes(&cfg).expect("comparison");
    assert_eq!(cmp.fixed.total_vehicles, cmp.adaptive.total_vehicles);
    assert!(cmp.fixed.completed_vehicles > 0);
    assert!(cmp.adaptive.completed_vehicles > 0);
    assert!(cmp.delay_reduction_pct().is_finite());
    assert!(cmp.to_string().contains("Adaptive delay reduction"));
}

#[test]
fn invalid_grid_is_a_configuration_error() {
    let mut cfg = common::small_config();
    cfg.network.grid_size = 1;
    cfg.simulation.vehicles = 0;
    match Scenario::from_config(&cfg) {
        Err(SimError::Configuration(errors)) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert!(fields.contains(&"network.grid_size"));
            assert!(fields.contains(&"simulation.vehicles"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn shipped_scenario_files_mirror_the_presets() {
    use std::path::Path;
    use urban_traffic_sim::config::ScenarioConfig;

    for name in ScenarioConfig::PRESETS {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("scenarios")
            .join(format!("{name}.toml"));
        let file = ScenarioConfig::from_toml_file(&path).expect("scenario file parses");
        let preset = ScenarioConfig::from_preset(name).expect("preset exists");
        assert!(file.validate().is_empty(), "{name} does not validate");
        assert_eq!(file.simulation.vehicles, preset.simulation.vehicles, "{name}");
        assert_eq!(file.signals.mode, preset.signals.mode, "{name}");
        assert_eq!(file.routing.mode, preset.routing.mode, "{name}");
    }
}
