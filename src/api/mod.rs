//! REST API over a finished run.
//!
//! Read-only GET endpoints:
//! - `/state`: scenario config, run report, and latest tick
//! - `/telemetry`: tick records with optional range filtering
//! - `/vehicles`: every vehicle summary
//! - `/vehicles/{id}`: one vehicle summary

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::config::ScenarioConfig;
use crate::runner::RunOutput;
use crate::sim::kpi::RunReport;
use crate::sim::types::{TickRecord, VehicleSummary};

/// Immutable application state shared across all request handlers.
///
/// Built once after the run completes and wrapped in `Arc`; no locks since
/// nothing is mutated.
pub struct AppState {
    /// Scenario the run was built from.
    pub config: ScenarioConfig,
    /// End-of-run report.
    pub report: RunReport,
    /// Per-tick metrics records.
    pub records: Vec<TickRecord>,
    /// Final per-vehicle summaries, indexed by vehicle id.
    pub vehicles: Vec<VehicleSummary>,
}

impl From<RunOutput> for AppState {
    fn from(out: RunOutput) -> Self {
        Self {
            config: out.config,
            report: out.report,
            records: out.records,
            vehicles: out.vehicles,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/vehicles", get(handlers::get_vehicles))
        .route("/vehicles/{id}", get(handlers::get_vehicle))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("API server listening on http://{addr}");
    axum::serve(listener, app).await
}
