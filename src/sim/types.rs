//! Core simulation types: engine configuration, per-tick records, vehicle summaries.

use std::fmt;

use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::network::NodeId;

use super::signal::{SignalMode, SignalTiming};
use super::vehicle::Vehicle;

/// Simulated seconds between progress log lines.
pub const PROGRESS_INTERVAL_S: f64 = 900.0;

/// Centralized engine configuration.
///
/// # Examples
///
/// ```
/// use urban_traffic_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(10_800, 1.0, 42);
/// assert_eq!(cfg.horizon_s(), 10_800.0);
/// assert_eq!(cfg.progress_every_ticks(), 900);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Ticks in the horizon.
    pub total_ticks: usize,
    /// Seconds per tick.
    pub dt_s: f64,
    /// Master random seed.
    pub seed: u64,
    /// Stop once every vehicle has completed.
    pub early_stop: bool,
    pub signal_mode: SignalMode,
    pub timing: SignalTiming,
}

impl SimConfig {
    /// Creates a configuration with default signal timing.
    ///
    /// # Panics
    ///
    /// Panics if `dt_s` is not positive.
    pub fn new(total_ticks: usize, dt_s: f64, seed: u64) -> Self {
        assert!(dt_s > 0.0, "dt_s must be > 0");
        Self {
            total_ticks,
            dt_s,
            seed,
            early_stop: true,
            signal_mode: SignalMode::Adaptive,
            timing: SignalTiming::default(),
        }
    }

    /// Engine configuration of a validated scenario.
    pub fn from_scenario(cfg: &ScenarioConfig) -> Self {
        Self {
            total_ticks: cfg.simulation.ticks(),
            dt_s: cfg.simulation.dt_s,
            seed: cfg.simulation.seed,
            early_stop: cfg.simulation.early_stop,
            signal_mode: cfg.signals.mode,
            timing: cfg.signals.timing(),
        }
    }

    /// Configured horizon in seconds.
    pub fn horizon_s(&self) -> f64 {
        self.total_ticks as f64 * self.dt_s
    }

    /// Ticks between progress log lines (at least 1).
    pub fn progress_every_ticks(&self) -> usize {
        ((PROGRESS_INTERVAL_S / self.dt_s).round() as usize).max(1)
    }
}

/// Metrics snapshot of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick: usize,
    /// Simulated time at the start of the tick (s).
    pub time_s: f64,
    /// Queued vehicles per intersection in index order, observed at tick start.
    pub queue_lengths: Vec<u32>,
    pub total_queue: u32,
    /// Vehicles completed up to and including this tick.
    pub completed_count: usize,
    pub completed_this_tick: usize,
    /// Vehicles not yet completed after this tick.
    pub in_network: usize,
    /// Cumulative emissions (g CO₂).
    pub emissions_total_g: f64,
    pub emissions_delta_g: f64,
    /// Intersections serving NS green after the signal update.
    pub ns_green: usize,
    pub ew_green: usize,
    pub yellow: usize,
}

impl fmt::Display for TickRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>5} ({:>7.0}s) | queued={:>4} | done={:>5} (+{}) in_net={:>5} | \
             CO2={:>10.1} g (+{:.1}) | NS={} EW={} Y={}",
            self.tick,
            self.time_s,
            self.total_queue,
            self.completed_count,
            self.completed_this_tick,
            self.in_network,
            self.emissions_total_g,
            self.emissions_delta_g,
            self.ns_green,
            self.ew_green,
            self.yellow,
        )
    }
}

/// End-of-run view of one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSummary {
    pub id: usize,
    pub origin: NodeId,
    pub destination: NodeId,
    /// Planned hops (route length − 1).
    pub hops: usize,
    pub travel_time_s: f64,
    pub delay_s: f64,
    pub emissions_g: f64,
    pub distance_m: f64,
    pub completed: bool,
    pub completed_tick: Option<usize>,
}

impl From<&Vehicle> for VehicleSummary {
    fn from(v: &Vehicle) -> Self {
        Self {
            id: v.id(),
            origin: v.origin(),
            destination: v.destination(),
            hops: v.route().len() - 1,
            travel_time_s: v.travel_time_s(),
            delay_s: v.delay_s(),
            emissions_g: v.emissions_g(),
            distance_m: v.distance_m(),
            completed: v.is_completed(),
            completed_tick: v.completed_tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_config_from_baseline() {
        let cfg = SimConfig::from_scenario(&ScenarioConfig::baseline());
        assert_eq!(cfg.total_ticks, 10_800);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.signal_mode, SignalMode::Adaptive);
        assert_eq!(cfg.horizon_s(), 10_800.0);
    }

    #[test]
    fn progress_interval_follows_dt() {
        assert_eq!(SimConfig::new(100, 0.5, 0).progress_every_ticks(), 1800);
        assert_eq!(SimConfig::new(100, 2000.0, 0).progress_every_ticks(), 1);
    }

    #[test]
    #[should_panic]
    fn sim_config_zero_dt_panics() {
        SimConfig::new(10, 0.0, 0);
    }

    #[test]
    fn tick_record_display_does_not_panic() {
        let r = TickRecord {
            tick: 12,
            time_s: 12.0,
            queue_lengths: vec![1, 0, 2, 0],
            total_queue: 3,
            completed_count: 4,
            completed_this_tick: 1,
            in_network: 6,
            emissions_total_g: 120.5,
            emissions_delta_g: 9.3,
            ns_green: 2,
            ew_green: 1,
            yellow: 1,
        };
        let s = format!("{r}");
        assert!(s.contains("queued=   3"));
    }

    #[test]
    fn summary_counts_hops() {
        let v = Vehicle::new(3, vec![NodeId(0, 0), NodeId(0, 1), NodeId(1, 1)]).expect("route");
        let s = VehicleSummary::from(&v);
        assert_eq!(s.hops, 2);
        assert_eq!(s.destination, NodeId(1, 1));
        assert!(!s.completed);
    }
}
