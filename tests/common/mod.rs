//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use urban_traffic_sim::config::ScenarioConfig;
use urban_traffic_sim::network::{LinkSpec, NetworkGraph, NodeId, RoutingMode};
use urban_traffic_sim::scenario::Scenario;
use urban_traffic_sim::sim::signal::SignalMode;
use urban_traffic_sim::sim::types::SimConfig;

/// Small mixed-routing scenario: 3x3 grid, 40 vehicles, 30 simulated minutes.
pub fn small_config() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.network.grid_size = 3;
    cfg.simulation.vehicles = 40;
    cfg.simulation.duration_s = 1800.0;
    cfg.simulation.seed = 7;
    cfg
}

/// Default 2x2 grid (500 m links at 13.9 m/s).
pub fn two_by_two() -> NetworkGraph {
    NetworkGraph::new(2, 1000.0, LinkSpec::default()).expect("2x2 grid is valid")
}

/// Scenario with hand-written routes on a 2x2 grid.
pub fn routed_scenario(routes: Vec<Vec<NodeId>>, mode: SignalMode, ticks: usize) -> Scenario {
    let mut config = SimConfig::new(ticks, 1.0, 42);
    config.signal_mode = mode;
    Scenario::from_routes(config, two_by_two(), routes).expect("routes are non-empty")
}

/// `small_config` with shortest-path routing only.
pub fn shortest_config() -> ScenarioConfig {
    let mut cfg = small_config();
    cfg.routing.mode = RoutingMode::Shortest;
    cfg
}
