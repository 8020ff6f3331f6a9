//! API response and query types.
//!
//! Telemetry field names follow the CSV export columns.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::sim::kpi::RunReport;
use crate::sim::types::TickRecord;

/// Combined state response: config, report, and latest tick.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: ScenarioConfig,
    pub report: RunReport,
    /// Last recorded tick, `null` for an empty run.
    pub latest_tick: Option<TelemetryRecord>,
}

/// Single telemetry record using CSV column names.
///
/// Maps `completed_count` to `completed`; queue lengths stay a flat array in
/// intersection index order.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    pub tick: usize,
    pub time_s: f64,
    pub total_queue: u32,
    pub completed: usize,
    pub completed_this_tick: usize,
    pub in_network: usize,
    pub emissions_total_g: f64,
    pub emissions_delta_g: f64,
    pub ns_green: usize,
    pub ew_green: usize,
    pub yellow: usize,
    pub queue_lengths: Vec<u32>,
}

impl From<&TickRecord> for TelemetryRecord {
    fn from(r: &TickRecord) -> Self {
        Self {
            tick: r.tick,
            time_s: r.time_s,
            total_queue: r.total_queue,
            completed: r.completed_count,
            completed_this_tick: r.completed_this_tick,
            in_network: r.in_network,
            emissions_total_g: r.emissions_total_g,
            emissions_delta_g: r.emissions_delta_g,
            ns_green: r.ns_green,
            ew_green: r.ew_green,
            yellow: r.yellow,
            queue_lengths: r.queue_lengths.clone(),
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start tick (inclusive).
    pub from: Option<usize>,
    /// End tick (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
