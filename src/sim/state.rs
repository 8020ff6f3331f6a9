//! The owned aggregate advanced by the engine: grid, signals, vehicles, counters.

use crate::error::SimError;
use crate::network::{Direction, NetworkGraph, NodeId};

use super::signal::{QueueCounts, SignalController, SignalMode, SignalPhase, SignalTiming};
use super::vehicle::{Kinematics, StepOutcome, Vehicle};

/// Aggregates produced by one vehicle pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehiclePass {
    pub completed_this_tick: usize,
    pub emissions_delta_g: f64,
    pub blocked: usize,
}

/// Signal phase histogram after an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub ns_green: usize,
    pub ew_green: usize,
    pub yellow: usize,
}

/// All mutable simulation state, owned by the engine.
///
/// Signals are stored in network index order, one per intersection.
#[derive(Debug, Clone)]
pub struct SimulationState {
    network: NetworkGraph,
    signals: Vec<SignalController>,
    vehicles: Vec<Vehicle>,
    completed_count: usize,
    total_emissions_g: f64,
}

impl SimulationState {
    pub fn new(
        network: NetworkGraph,
        vehicles: Vec<Vehicle>,
        mode: SignalMode,
        timing: SignalTiming,
    ) -> Self {
        let signals = network
            .nodes()
            .map(|node| SignalController::new(node, mode, timing))
            .collect();
        let completed_count = vehicles.iter().filter(|v| v.is_completed()).count();
        Self {
            network,
            signals,
            vehicles,
            completed_count,
            total_emissions_g: 0.0,
        }
    }

    pub fn network(&self) -> &NetworkGraph {
        &self.network
    }

    pub fn signals(&self) -> &[SignalController] {
        &self.signals
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn total_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn in_network(&self) -> usize {
        self.vehicles.len() - self.completed_count
    }

    pub fn total_emissions_g(&self) -> f64 {
        self.total_emissions_g
    }

    pub fn all_completed(&self) -> bool {
        self.completed_count == self.vehicles.len()
    }

    /// Mean travel time of completed vehicles, 0 before the first completion.
    pub fn mean_travel_time_s(&self) -> f64 {
        if self.completed_count == 0 {
            return 0.0;
        }
        let total: f64 = self
            .vehicles
            .iter()
            .filter(|v| v.is_completed())
            .map(Vehicle::travel_time_s)
            .sum();
        total / self.completed_count as f64
    }

    /// Queued vehicles per intersection, bucketed by next-hop direction.
    pub fn tally_queues(&self) -> Vec<QueueCounts> {
        let mut queues = vec![QueueCounts::default(); self.network.node_count()];
        for v in &self.vehicles {
            if let Some(dir) = v.queued_direction() {
                queues[self.network.index(v.position())].add(dir);
            }
        }
        queues
    }

    /// Advances every signal by one tick from the given snapshot.
    ///
    /// Returns the number of phase transitions.
    pub fn update_signals(&mut self, queues: &[QueueCounts], dt_s: f64) -> usize {
        let mut transitions = 0;
        for (signal, q) in self.signals.iter_mut().zip(queues) {
            if signal.update(*q, dt_s) {
                transitions += 1;
            }
        }
        transitions
    }

    pub fn phase_counts(&self) -> PhaseCounts {
        let mut counts = PhaseCounts::default();
        for s in &self.signals {
            match s.phase() {
                SignalPhase::NsGreen => counts.ns_green += 1,
                SignalPhase::EwGreen => counts.ew_green += 1,
                SignalPhase::Yellow => counts.yellow += 1,
            }
        }
        counts
    }

    /// Runs the per-tick transition of every vehicle not yet completed.
    ///
    /// Vehicles read the signal states left by [`Self::update_signals`];
    /// signals are not touched during the pass.
    ///
    /// # Errors
    ///
    /// Propagates vehicle consistency failures.
    pub fn step_vehicles(&mut self, tick: usize, kin: &Kinematics) -> Result<VehiclePass, SimError> {
        let network = &self.network;
        let signals = &self.signals;
        let can_pass = |node: NodeId, dir: Direction| signals[network.index(node)].can_pass(dir);

        let mut pass = VehiclePass::default();
        for v in self.vehicles.iter_mut().filter(|v| !v.is_completed()) {
            let step = v.step(tick, kin, &can_pass)?;
            match step.outcome {
                StepOutcome::Completed => pass.completed_this_tick += 1,
                StepOutcome::Blocked => pass.blocked += 1,
                _ => {}
            }
            pass.emissions_delta_g += step.emitted_g;
        }

        self.completed_count += pass.completed_this_tick;
        self.total_emissions_g += pass.emissions_delta_g;
        Ok(pass)
    }

    /// Checks that every vehicle is either completed or still in the network.
    ///
    /// # Errors
    ///
    /// [`SimError::InternalConsistency`] when the running counter disagrees
    /// with the vehicle flags.
    pub fn check_conservation(&self, tick: usize) -> Result<(), SimError> {
        let flagged = self.vehicles.iter().filter(|v| v.is_completed()).count();
        if flagged != self.completed_count || self.completed_count > self.vehicles.len() {
            return Err(SimError::consistency(format!(
                "tick {tick}: completed counter {} disagrees with {flagged} completed of {} vehicles",
                self.completed_count,
                self.vehicles.len()
            )));
        }
        Ok(())
    }
}
