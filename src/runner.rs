//! One-call scenario runs and the fixed vs adaptive comparison.

use std::fmt;

use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::scenario::Scenario;
use crate::sim::kpi::RunReport;
use crate::sim::signal::SignalMode;
use crate::sim::types::{TickRecord, VehicleSummary};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub config: ScenarioConfig,
    pub records: Vec<TickRecord>,
    pub vehicles: Vec<VehicleSummary>,
    pub report: RunReport,
}

/// Builds and runs `cfg` standalone.
///
/// # Errors
///
/// Propagates configuration, planning and consistency errors.
pub fn run_scenario(cfg: &ScenarioConfig) -> Result<RunOutput, SimError> {
    let mut engine = Scenario::from_config(cfg)?.into_engine();
    let report = engine.run()?;
    let (records, vehicles) = engine.into_parts();
    Ok(RunOutput {
        config: cfg.clone(),
        records,
        vehicles,
        report,
    })
}

/// Reports of the same demand under both signal modes.
#[derive(Debug, Clone, Serialize)]
pub struct ModeComparison {
    pub fixed: RunReport,
    pub adaptive: RunReport,
}

impl ModeComparison {
    /// Relative delay reduction of adaptive over fixed control, in percent.
    pub fn delay_reduction_pct(&self) -> f64 {
        if self.fixed.avg_delay_s > 0.0 {
            100.0 * (self.fixed.avg_delay_s - self.adaptive.avg_delay_s) / self.fixed.avg_delay_s
        } else {
            0.0
        }
    }
}

impl fmt::Display for ModeComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = (&self.fixed, &self.adaptive);
        writeln!(f, "--- Signal Strategy Comparison ---")?;
        writeln!(f, "{:<24}{:>12}{:>12}", "metric", "fixed", "adaptive")?;
        writeln!(
            f,
            "{:<24}{:>12.1}{:>12.1}",
            "avg travel time (s)",
            a.avg_travel_time_s,
            b.avg_travel_time_s,
        )?;
        writeln!(f, "{:<24}{:>12.1}{:>12.1}", "avg delay (s)", a.avg_delay_s, b.avg_delay_s)?;
        writeln!(
            f,
            "{:<24}{:>11.1}%{:>11.1}%",
            "completion rate",
            a.completion_rate * 100.0,
            b.completion_rate * 100.0
        )?;
        writeln!(
            f,
            "{:<24}{:>12.1}{:>12.1}",
            "throughput (veh/hr)",
            a.throughput_veh_per_hr,
            b.throughput_veh_per_hr,
        )?;
        writeln!(f, "{:<24}{:>12.2}{:>12.2}", "avg queue (veh)", a.avg_queue, b.avg_queue)?;
        writeln!(f, "{:<24}{:>12}{:>12}", "max queue (veh)", a.max_queue, b.max_queue)?;
        writeln!(
            f,
            "{:<24}{:>12.1}{:>12.1}",
            "CO2 per vehicle (g)",
            a.avg_emissions_per_vehicle_g,
            b.avg_emissions_per_vehicle_g
        )?;
        write!(f, "Adaptive delay reduction: {:.1}%", self.delay_reduction_pct())
    }
}

/// Runs `cfg` once per signal mode with identical demand and routes.
///
/// # Errors
///
/// Propagates errors from either run.
pub fn compare_signal_modes(cfg: &ScenarioConfig) -> Result<ModeComparison, SimError> {
    let scenario = Scenario::from_config(cfg)?;

    log::info!("running fixed-time control");
    let fixed = scenario
        .clone()
        .with_signal_mode(SignalMode::Fixed)
        .into_engine()
        .run()?;

    log::info!("running adaptive control");
    let adaptive = scenario
        .with_signal_mode(SignalMode::Adaptive)
        .into_engine()
        .run()?;

    Ok(ModeComparison { fixed, adaptive })
}
