//! Post-hoc run report from the metrics sink and vehicle summaries.

use std::fmt;

use serde::Serialize;

use super::metrics::MetricsCollector;
use super::types::VehicleSummary;

/// Aggregate indicators of a complete run.
///
/// Queue figures come from the collector's running per-intersection
/// accumulation. Travel-time and delay averages cover completed vehicles only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub total_vehicles: usize,
    pub completed_vehicles: usize,
    /// Fraction of vehicles that reached their destination (0.0-1.0).
    pub completion_rate: f64,
    pub avg_travel_time_s: f64,
    pub avg_delay_s: f64,
    /// Completed vehicles per hour of configured horizon.
    pub throughput_veh_per_hr: f64,
    /// Mean over intersections of the per-intersection mean queue.
    pub avg_queue: f64,
    pub max_queue: u32,
    pub total_emissions_kg: f64,
    pub avg_emissions_per_vehicle_g: f64,
    pub ticks_run: usize,
}

impl RunReport {
    /// Computes the report.
    ///
    /// # Arguments
    ///
    /// * `metrics` - Collector that recorded every tick of the run
    /// * `vehicles` - Final state of every vehicle
    /// * `horizon_s` - Configured simulation horizon in seconds
    pub fn from_metrics(
        metrics: &MetricsCollector,
        vehicles: &[VehicleSummary],
        horizon_s: f64,
    ) -> Self {
        let total = vehicles.len();
        let completed: Vec<&VehicleSummary> = vehicles.iter().filter(|v| v.completed).collect();
        let n_done = completed.len();

        let mean = |f: fn(&VehicleSummary) -> f64| {
            if n_done == 0 {
                0.0
            } else {
                completed.iter().map(|v| f(v)).sum::<f64>() / n_done as f64
            }
        };

        let total_emissions_g: f64 = vehicles.iter().map(|v| v.emissions_g).sum();

        Self {
            total_vehicles: total,
            completed_vehicles: n_done,
            completion_rate: if total > 0 {
                n_done as f64 / total as f64
            } else {
                0.0
            },
            avg_travel_time_s: mean(|v| v.travel_time_s),
            avg_delay_s: mean(|v| v.delay_s),
            throughput_veh_per_hr: if horizon_s > 0.0 {
                n_done as f64 / (horizon_s / 3600.0)
            } else {
                0.0
            },
            avg_queue: metrics.avg_queue(),
            max_queue: metrics.max_queue(),
            total_emissions_kg: total_emissions_g / 1000.0,
            avg_emissions_per_vehicle_g: if total > 0 {
                total_emissions_g / total as f64
            } else {
                0.0
            },
            ticks_run: metrics.records().len(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Traffic Report ---")?;
        writeln!(
            f,
            "Vehicles completed:    {} / {} ({:.1}%)",
            self.completed_vehicles,
            self.total_vehicles,
            self.completion_rate * 100.0
        )?;
        writeln!(f, "Avg travel time:       {:.1} s", self.avg_travel_time_s)?;
        writeln!(f, "Avg delay:             {:.1} s", self.avg_delay_s)?;
        writeln!(f, "Throughput:            {:.1} veh/hr", self.throughput_veh_per_hr)?;
        writeln!(f, "Avg queue:             {:.2} veh", self.avg_queue)?;
        writeln!(f, "Max queue:             {} veh", self.max_queue)?;
        writeln!(f, "Total emissions:       {:.2} kg CO2", self.total_emissions_kg)?;
        writeln!(
            f,
            "Emissions per vehicle: {:.1} g CO2",
            self.avg_emissions_per_vehicle_g
        )?;
        write!(f, "Ticks run:             {}", self.ticks_run)
    }
}
