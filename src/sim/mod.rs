/// Simulation clock for tick management.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Per-tick metrics sink.
pub mod metrics;
/// Per-intersection signal control.
pub mod signal;
pub mod state;
/// Time-advance boundary for co-simulation.
pub mod sync;
pub mod types;
pub mod vehicle;
