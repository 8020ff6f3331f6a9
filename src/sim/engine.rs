//! Simulation engine that orchestrates signals, vehicles, metrics and time sync.

use crate::error::SimError;

use super::clock::Clock;
use super::kpi::RunReport;
use super::metrics::MetricsCollector;
use super::state::SimulationState;
use super::sync::{Standalone, TimeSync};
use super::types::{SimConfig, TickRecord, VehicleSummary};
use super::vehicle::Kinematics;

/// Slack allowed when comparing granted and requested times.
const TIME_EPSILON_S: f64 = 1e-9;

/// Simulation engine owning the state, metrics sink and clock.
///
/// Generic over `S: TimeSync` for static dispatch; standalone runs use
/// [`Standalone`].
pub struct Engine<S: TimeSync = Standalone> {
    config: SimConfig,
    kinematics: Kinematics,
    state: SimulationState,
    metrics: MetricsCollector,
    clock: Clock,
    sync: S,
    /// Tick whose time advance has not been granted yet.
    pending_grant: Option<usize>,
    sim_time_s: f64,
    early_stop_logged: bool,
}

impl Engine<Standalone> {
    /// Creates a standalone engine.
    pub fn new(config: SimConfig, state: SimulationState) -> Self {
        Self::with_sync(config, state, Standalone)
    }
}

impl<S: TimeSync> Engine<S> {
    /// Creates an engine that asks `sync` before advancing past each tick.
    pub fn with_sync(config: SimConfig, state: SimulationState, sync: S) -> Self {
        let kinematics = Kinematics::new(state.network().link_spec(), config.dt_s);
        let metrics = MetricsCollector::new(state.network().node_count(), config.total_ticks);
        let clock = Clock::new(config.total_ticks, config.dt_s);
        Self {
            config,
            kinematics,
            state,
            metrics,
            clock,
            sync,
            pending_grant: None,
            sim_time_s: 0.0,
            early_stop_logged: false,
        }
    }

    /// Executes one tick and returns its record, or `None` when finished.
    ///
    /// Order within a tick: queue tally, signal updates from that tally,
    /// vehicle transitions against the updated signals, metrics, then the
    /// time-advance request.
    ///
    /// # Errors
    ///
    /// Consistency errors are fatal. A [`SimError::StalledSynchronization`]
    /// leaves the finished tick recorded and its grant outstanding; the next
    /// call waits for that grant before starting a new tick.
    pub fn step(&mut self) -> Result<Option<TickRecord>, SimError> {
        self.complete_pending_grant()?;
        if self.is_finished() {
            return Ok(None);
        }
        let Some(tick) = self.clock.tick() else {
            return Ok(None);
        };
        let dt = self.config.dt_s;

        // 1. Pre-update snapshot and signal control
        let queues = self.state.tally_queues();
        let transitions = self.state.update_signals(&queues, dt);
        if transitions > 0 {
            log::trace!("tick {tick}: {transitions} signal transitions");
        }

        // 2. Vehicle transitions
        let pass = self.state.step_vehicles(tick, &self.kinematics)?;
        self.state.check_conservation(tick)?;

        // 3. Metrics
        let queue_lengths: Vec<u32> = queues.iter().map(|q| q.total()).collect();
        let phases = self.state.phase_counts();
        let record = TickRecord {
            tick,
            time_s: self.clock.time_s(tick),
            total_queue: queue_lengths.iter().sum(),
            queue_lengths,
            completed_count: self.state.completed_count(),
            completed_this_tick: pass.completed_this_tick,
            in_network: self.state.in_network(),
            emissions_total_g: self.state.total_emissions_g(),
            emissions_delta_g: pass.emissions_delta_g,
            ns_green: phases.ns_green,
            ew_green: phases.ew_green,
            yellow: phases.yellow,
        };
        self.metrics.record(record.clone())?;
        self.log_progress(tick);

        // 4. Time advance
        self.pending_grant = Some(tick);
        self.complete_pending_grant()?;

        Ok(Some(record))
    }

    fn complete_pending_grant(&mut self) -> Result<(), SimError> {
        let Some(tick) = self.pending_grant else {
            return Ok(());
        };
        let requested = self.clock.time_s(tick + 1);
        let granted = self.sync.request_next_time(tick, requested)?;
        self.pending_grant = None;
        if granted + TIME_EPSILON_S < requested {
            return Err(SimError::consistency(format!(
                "tick {tick}: granted time {granted} s is before requested {requested} s"
            )));
        }
        self.sim_time_s = granted;
        Ok(())
    }

    fn log_progress(&self, tick: usize) {
        if (tick + 1) % self.config.progress_every_ticks() == 0 {
            log::info!(
                "t={:.0}s: {}/{} completed, mean travel {:.1}s, max queue {}",
                self.clock.time_s(tick + 1),
                self.state.completed_count(),
                self.state.total_vehicles(),
                self.state.mean_travel_time_s(),
                self.metrics.max_queue()
            );
        }
    }

    /// Runs ticks until the horizon ends or, with early stop, every vehicle
    /// has completed. Returns the run report.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::step`]; after a stall, calling `run` again resumes
    /// where it stopped.
    pub fn run(&mut self) -> Result<RunReport, SimError> {
        while !self.is_finished() {
            if self.step()?.is_none() {
                break;
            }
        }
        self.complete_pending_grant()?;

        if self.state.all_completed() && !self.clock.is_exhausted() && !self.early_stop_logged {
            log::info!(
                "all {} vehicles completed at t={:.0}s, stopping early",
                self.state.total_vehicles(),
                self.sim_time_s
            );
            self.early_stop_logged = true;
        }
        log::info!(
            "run finished after {} ticks: {}/{} completed",
            self.metrics.records().len(),
            self.state.completed_count(),
            self.state.total_vehicles()
        );
        Ok(self.report())
    }

    /// No more ticks will run and no grant is outstanding.
    pub fn is_finished(&self) -> bool {
        self.pending_grant.is_none()
            && (self.clock.is_exhausted() || (self.config.early_stop && self.state.all_completed()))
    }

    /// Report over the ticks run so far.
    pub fn report(&self) -> RunReport {
        RunReport::from_metrics(
            &self.metrics,
            &self.vehicle_summaries(),
            self.config.horizon_s(),
        )
    }

    pub fn vehicle_summaries(&self) -> Vec<VehicleSummary> {
        self.state.vehicles().iter().map(VehicleSummary::from).collect()
    }

    pub fn records(&self) -> &[TickRecord] {
        self.metrics.records()
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Last granted simulated time (s).
    pub fn sim_time_s(&self) -> f64 {
        self.sim_time_s
    }

    /// Consumes the engine, returning its records and vehicle summaries.
    pub fn into_parts(self) -> (Vec<TickRecord>, Vec<VehicleSummary>) {
        let vehicles = self.vehicle_summaries();
        (self.metrics.into_records(), vehicles)
    }
}
