//! Grid-based urban traffic simulator with adaptive signal control.

#[cfg(feature = "api")]
pub mod api;
/// TOML scenario configuration and presets.
pub mod config;
pub mod error;
pub mod io;
/// Grid topology and route planning.
pub mod network;
pub mod runner;
pub mod scenario;
/// Simulation engine, signals, vehicles and metrics.
pub mod sim;
#[cfg(feature = "tui")]
pub mod tui;
