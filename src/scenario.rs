//! Scenario construction: grid, demand sampling and route assignment.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::network::{NetworkGraph, NodeId, RoutePlanner};
use crate::sim::engine::Engine;
use crate::sim::signal::SignalMode;
use crate::sim::state::SimulationState;
use crate::sim::sync::TimeSync;
use crate::sim::types::SimConfig;
use crate::sim::vehicle::Vehicle;

/// A fully initialized scenario, ready to be turned into an engine.
///
/// All randomness (origins, destinations, alternate routes) is drawn from a
/// single generator seeded with `simulation.seed`, so equal configurations
/// build equal scenarios.
#[derive(Debug, Clone)]
pub struct Scenario {
    config: SimConfig,
    network: NetworkGraph,
    vehicles: Vec<Vehicle>,
}

impl Scenario {
    /// Validates `cfg`, builds the grid and plans one route per vehicle.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] with every violation found, or
    /// [`SimError::Planning`] if a vehicle cannot be routed.
    pub fn from_config(cfg: &ScenarioConfig) -> Result<Self, SimError> {
        let errors = cfg.validate();
        if !errors.is_empty() {
            return Err(SimError::Configuration(errors));
        }

        let network = NetworkGraph::new(
            cfg.network.grid_size,
            cfg.network.spacing_m,
            cfg.network.link_spec(),
        )?;
        let mut rng = StdRng::seed_from_u64(cfg.simulation.seed);
        let planner = RoutePlanner::new(&network, cfg.routing.jitter);

        let mut vehicles = Vec::with_capacity(cfg.simulation.vehicles);
        for id in 0..cfg.simulation.vehicles {
            let (origin, destination) = sample_od_pair(&network, &mut rng);
            let route = planner.plan(
                cfg.routing.mode,
                origin,
                destination,
                cfg.routing.alternatives,
                &mut rng,
            )?;
            vehicles.push(Vehicle::new(id, route)?);
        }

        log::info!(
            "initialized {} vehicles on a {}x{} grid ({} routing, {} signals, seed {})",
            vehicles.len(),
            network.size(),
            network.size(),
            cfg.routing.mode.label(),
            cfg.signals.mode.label(),
            cfg.simulation.seed
        );

        Ok(Self {
            config: SimConfig::from_scenario(cfg),
            network,
            vehicles,
        })
    }

    /// Builds a scenario from explicit routes on an existing grid.
    ///
    /// # Errors
    ///
    /// [`SimError::InternalConsistency`] for an empty route.
    pub fn from_routes(
        config: SimConfig,
        network: NetworkGraph,
        routes: Vec<Vec<NodeId>>,
    ) -> Result<Self, SimError> {
        let vehicles = routes
            .into_iter()
            .enumerate()
            .map(|(id, route)| Vehicle::new(id, route))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            config,
            network,
            vehicles,
        })
    }

    /// Same demand and routes under a different signal mode.
    pub fn with_signal_mode(mut self, mode: SignalMode) -> Self {
        self.config.signal_mode = mode;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &NetworkGraph {
        &self.network
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Standalone engine over this scenario.
    pub fn into_engine(self) -> Engine {
        let (config, state) = self.into_state();
        Engine::new(config, state)
    }

    /// Engine that waits on `sync` before advancing past each tick.
    pub fn into_engine_with_sync<S: TimeSync>(self, sync: S) -> Engine<S> {
        let (config, state) = self.into_state();
        Engine::with_sync(config, state, sync)
    }

    fn into_state(self) -> (SimConfig, SimulationState) {
        let state = SimulationState::new(
            self.network,
            self.vehicles,
            self.config.signal_mode,
            self.config.timing,
        );
        (self.config, state)
    }
}

/// Uniform origin, destination resampled until it differs from the origin.
fn sample_od_pair<R: Rng + ?Sized>(network: &NetworkGraph, rng: &mut R) -> (NodeId, NodeId) {
    let n = network.node_count();
    let origin = network.node_at(rng.random_range(0..n));
    let mut destination = network.node_at(rng.random_range(0..n));
    while destination == origin {
        destination = network.node_at(rng.random_range(0..n));
    }
    (origin, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RoutingMode;

    fn small(vehicles: usize, mode: RoutingMode) -> ScenarioConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.vehicles = vehicles;
        cfg.routing.mode = mode;
        cfg
    }

    #[test]
    fn every_vehicle_gets_a_valid_route() {
        let s = Scenario::from_config(&small(200, RoutingMode::Mixed)).expect("scenario");
        assert_eq!(s.vehicles().len(), 200);
        for v in s.vehicles() {
            assert_ne!(v.origin(), v.destination());
            for pair in v.route().windows(2) {
                assert_eq!(s.network().manhattan_distance(pair[0], pair[1]), 1);
            }
        }
    }

    #[test]
    fn shortest_routing_gives_manhattan_routes() {
        let s = Scenario::from_config(&small(100, RoutingMode::Shortest)).expect("scenario");
        for v in s.vehicles() {
            let d = s.network().manhattan_distance(v.origin(), v.destination()) as usize;
            assert_eq!(v.route().len() - 1, d);
        }
    }

    #[test]
    fn same_seed_same_demand() {
        let cfg = small(50, RoutingMode::StochasticAlternate);
        let a = Scenario::from_config(&cfg).expect("scenario");
        let b = Scenario::from_config(&cfg).expect("scenario");
        let routes = |s: &Scenario| s.vehicles().iter().map(|v| v.route().to_vec()).collect::<Vec<_>>();
        assert_eq!(routes(&a), routes(&b));
    }

    #[test]
    fn different_seed_different_demand() {
        let mut cfg = small(50, RoutingMode::Shortest);
        let a = Scenario::from_config(&cfg).expect("scenario");
        cfg.simulation.seed = 43;
        let b = Scenario::from_config(&cfg).expect("scenario");
        let ods = |s: &Scenario| {
            s.vehicles()
                .iter()
                .map(|v| (v.origin(), v.destination()))
                .collect::<Vec<_>>()
        };
        assert_ne!(ods(&a), ods(&b));
    }

    #[test]
    fn invalid_config_reports_all_errors() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.network.grid_size = 0;
        cfg.simulation.vehicles = 0;
        match Scenario::from_config(&cfg) {
            Err(SimError::Configuration(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn signal_mode_override_keeps_routes() {
        let s = Scenario::from_config(&small(20, RoutingMode::Mixed)).expect("scenario");
        let before: Vec<_> = s.vehicles().iter().map(|v| v.route().to_vec()).collect();
        let fixed = s.with_signal_mode(SignalMode::Fixed);
        assert_eq!(fixed.config().signal_mode, SignalMode::Fixed);
        let after: Vec<_> = fixed.vehicles().iter().map(|v| v.route().to_vec()).collect();
        assert_eq!(before, after);
    }
}
