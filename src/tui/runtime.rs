//! Live engine stepping and TUI application state.

use std::collections::VecDeque;
use std::time::Instant;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::scenario::Scenario;
use crate::sim::engine::Engine;
use crate::sim::signal::SignalPhase;
use crate::sim::types::TickRecord;

/// Maximum number of history entries kept for the rolling chart.
const MAX_HISTORY: usize = 300;

/// Tick interval options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 7] = [500, 250, 100, 50, 20, 5, 1];

/// Default speed index (50 ms).
const DEFAULT_SPEED_IDX: usize = 3;

/// TUI application state.
pub struct App {
    engine: Engine,
    /// Scenario kept for restart.
    scenario: ScenarioConfig,
    /// Rolling history of tick records for the chart.
    pub history: VecDeque<TickRecord>,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
    /// Name of the active preset or scenario file.
    pub label: String,
    /// Engine error that stopped the run, if any.
    pub error: Option<String>,
}

impl App {
    /// Builds the app around a fresh engine for `scenario`.
    ///
    /// # Errors
    ///
    /// Returns the scenario construction error (invalid config or an
    /// unroutable demand).
    pub fn new(scenario: ScenarioConfig, label: &str) -> Result<Self, SimError> {
        let engine = Scenario::from_config(&scenario)?.into_engine();
        Ok(Self {
            engine,
            scenario,
            history: VecDeque::with_capacity(MAX_HISTORY),
            paused: false,
            speed_idx: DEFAULT_SPEED_IDX,
            quit: false,
            last_tick: Instant::now(),
            label: label.to_string(),
            error: None,
        })
    }

    /// Advances the engine by one tick unless finished or failed.
    pub fn tick(&mut self) {
        if self.is_finished() {
            return;
        }
        match self.engine.step() {
            Ok(Some(record)) => {
                if self.history.len() >= MAX_HISTORY {
                    self.history.pop_front();
                }
                self.history.push_back(record);
            }
            Ok(None) => {}
            Err(e) => {
                self.error = Some(e.to_string());
                self.paused = true;
            }
        }
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Increases simulation speed (shorter tick interval).
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Decreases simulation speed (longer tick interval).
    pub fn speed_down(&mut self) {
        self.speed_idx = self.speed_idx.saturating_sub(1);
    }

    /// Returns the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Switches to a built-in preset, keeping the current run when the
    /// preset cannot be built.
    pub fn switch_preset(&mut self, name: &str) {
        let Ok(scenario) = ScenarioConfig::from_preset(name) else {
            return;
        };
        self.reload(scenario, name);
    }

    /// Restarts the current scenario from tick zero.
    pub fn restart(&mut self) {
        let scenario = self.scenario.clone();
        let label = self.label.clone();
        self.reload(scenario, &label);
    }

    fn reload(&mut self, scenario: ScenarioConfig, label: &str) {
        match Scenario::from_config(&scenario) {
            Ok(built) => {
                self.engine = built.into_engine();
                self.scenario = scenario;
                self.history.clear();
                self.paused = false;
                self.error = None;
                self.label = label.to_string();
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Ticks executed so far.
    pub fn ticks_run(&self) -> usize {
        self.engine.records().len()
    }

    pub fn total_ticks(&self) -> usize {
        self.engine.config().total_ticks
    }

    /// Returns `true` once the engine stops or an error halted it.
    pub fn is_finished(&self) -> bool {
        self.error.is_some() || self.engine.is_finished()
    }

    /// Fraction of vehicles that reached their destination.
    pub fn completion_ratio(&self) -> f64 {
        let state = self.engine.state();
        if state.total_vehicles() == 0 {
            return 0.0;
        }
        state.completed_count() as f64 / state.total_vehicles() as f64
    }

    pub fn completed(&self) -> usize {
        self.engine.state().completed_count()
    }

    pub fn total_vehicles(&self) -> usize {
        self.engine.state().total_vehicles()
    }

    pub fn mean_travel_time_s(&self) -> f64 {
        self.engine.state().mean_travel_time_s()
    }

    /// Returns the most recent tick record, if any.
    pub fn last_record(&self) -> Option<&TickRecord> {
        self.history.back()
    }

    /// Grid side length.
    pub fn grid_size(&self) -> usize {
        self.engine.state().network().size()
    }

    /// Phase and latest queue of each intersection, in index order.
    pub fn intersections(&self) -> Vec<(SignalPhase, u32)> {
        let queues = self.last_record().map(|r| r.queue_lengths.as_slice());
        self.engine
            .state()
            .signals()
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let q = queues.and_then(|q| q.get(idx).copied()).unwrap_or(0);
                (s.phase(), q)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ScenarioConfig {
        let mut cfg = ScenarioConfig::light_traffic();
        cfg.network.grid_size = 3;
        cfg.simulation.vehicles = 20;
        cfg.simulation.duration_s = 600.0;
        cfg
    }

    #[test]
    fn app_creates_and_ticks() {
        let mut app = App::new(small(), "small").unwrap();
        assert_eq!(app.ticks_run(), 0);
        assert!(!app.is_finished());

        app.tick();
        assert_eq!(app.ticks_run(), 1);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.intersections().len(), 9);
    }

    #[test]
    fn app_finishes_and_stops_ticking() {
        let mut app = App::new(small(), "small").unwrap();
        for _ in 0..app.total_ticks() {
            app.tick();
        }
        assert!(app.is_finished());
        let before = app.ticks_run();
        app.tick();
        assert_eq!(app.ticks_run(), before);
        assert!(app.history.len() <= MAX_HISTORY);
    }

    #[test]
    fn speed_controls_stay_in_bounds() {
        let mut app = App::new(small(), "small").unwrap();
        for _ in 0..10 {
            app.speed_down();
        }
        assert_eq!(app.speed_idx, 0);
        for _ in 0..10 {
            app.speed_up();
        }
        assert_eq!(app.speed_idx, SPEED_LEVELS_MS.len() - 1);
    }

    #[test]
    fn restart_resets_history() {
        let mut app = App::new(small(), "small").unwrap();
        for _ in 0..5 {
            app.tick();
        }
        app.restart();
        assert_eq!(app.ticks_run(), 0);
        assert!(app.history.is_empty());
        assert_eq!(app.label, "small");
    }

    #[test]
    fn unknown_preset_keeps_current_run() {
        let mut app = App::new(small(), "small").unwrap();
        app.tick();
        app.switch_preset("rush_hour");
        assert_eq!(app.label, "small");
        assert_eq!(app.ticks_run(), 1);
    }

    #[test]
    fn toggle_pause() {
        let mut app = App::new(small(), "small").unwrap();
        assert!(!app.paused);
        app.toggle_pause();
        assert!(app.paused);
    }
}
