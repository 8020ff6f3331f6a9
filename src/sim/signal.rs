//! Per-intersection signal state machine with fixed or queue-adaptive green times.

use serde::{Deserialize, Serialize};

use crate::network::{Direction, NodeId};

/// Green-time policy, chosen once per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Constant `min_green_s` for both phases.
    Fixed,
    /// Green time proportional to the queue share of the phase.
    Adaptive,
}

impl SignalMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Adaptive => "adaptive",
        }
    }
}

/// Green-time bounds and yellow clearance, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalTiming {
    pub min_green_s: f64,
    pub max_green_s: f64,
    pub yellow_s: f64,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            min_green_s: 15.0,
            max_green_s: 90.0,
            yellow_s: 3.0,
        }
    }
}

/// Stopped vehicles at one intersection, bucketed by the direction they
/// want to move next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    pub ns: u32,
    pub ew: u32,
}

impl QueueCounts {
    pub fn total(&self) -> u32 {
        self.ns + self.ew
    }

    pub fn get(&self, dir: Direction) -> u32 {
        match dir {
            Direction::NorthSouth => self.ns,
            Direction::EastWest => self.ew,
        }
    }

    pub fn add(&mut self, dir: Direction) {
        match dir {
            Direction::NorthSouth => self.ns += 1,
            Direction::EastWest => self.ew += 1,
        }
    }
}

/// Observable phase of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalPhase {
    NsGreen,
    EwGreen,
    Yellow,
}

/// Raw timing state of one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalState {
    /// Green phase currently being served, or just ended while yellow.
    pub current_phase: Direction,
    pub phase_elapsed_s: f64,
    pub green_duration_s: f64,
    pub is_yellow: bool,
    pub yellow_elapsed_s: f64,
}

/// Adaptive green time `T_min + (T_max − T_min) · q_phase / q_total`.
///
/// Returns `T_min` in fixed mode or when nobody is queued.
pub fn green_time(timing: &SignalTiming, mode: SignalMode, q_phase: u32, q_total: u32) -> f64 {
    match mode {
        SignalMode::Fixed => timing.min_green_s,
        SignalMode::Adaptive if q_total == 0 => timing.min_green_s,
        SignalMode::Adaptive => {
            let share = f64::from(q_phase.min(q_total)) / f64::from(q_total);
            timing.min_green_s + (timing.max_green_s - timing.min_green_s) * share
        }
    }
}

/// Signal controller for one intersection.
///
/// Starts in NS green. The first green duration is computed from the
/// queues seen on the first [`SignalController::update`].
#[derive(Debug, Clone)]
pub struct SignalController {
    node: NodeId,
    mode: SignalMode,
    timing: SignalTiming,
    state: SignalState,
    timing_pending: bool,
}

impl SignalController {
    pub fn new(node: NodeId, mode: SignalMode, timing: SignalTiming) -> Self {
        Self {
            node,
            mode,
            timing,
            state: SignalState {
                current_phase: Direction::NorthSouth,
                phase_elapsed_s: 0.0,
                green_duration_s: timing.min_green_s,
                is_yellow: false,
                yellow_elapsed_s: 0.0,
            },
            timing_pending: true,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    pub fn state(&self) -> &SignalState {
        &self.state
    }

    pub fn phase(&self) -> SignalPhase {
        match (self.state.is_yellow, self.state.current_phase) {
            (true, _) => SignalPhase::Yellow,
            (false, Direction::NorthSouth) => SignalPhase::NsGreen,
            (false, Direction::EastWest) => SignalPhase::EwGreen,
        }
    }

    /// Advances the state machine by one tick of `dt_s` seconds.
    ///
    /// Transitions are evaluated against the time already spent in the
    /// current phase, then the tick is charged. Returns `true` when the
    /// phase changed.
    pub fn update(&mut self, queues: QueueCounts, dt_s: f64) -> bool {
        if self.timing_pending {
            self.state.green_duration_s = self.compute_green(self.state.current_phase, queues);
            self.timing_pending = false;
        }

        let s = &mut self.state;
        let mut changed = false;
        if s.is_yellow {
            if s.yellow_elapsed_s >= self.timing.yellow_s {
                let next = s.current_phase.opposite();
                s.is_yellow = false;
                s.yellow_elapsed_s = 0.0;
                s.current_phase = next;
                s.phase_elapsed_s = 0.0;
                s.green_duration_s =
                    green_time(&self.timing, self.mode, queues.get(next), queues.total());
                changed = true;
            }
        } else if s.phase_elapsed_s >= s.green_duration_s {
            s.is_yellow = true;
            s.yellow_elapsed_s = 0.0;
            changed = true;
        }

        if s.is_yellow {
            s.yellow_elapsed_s += dt_s;
        } else {
            s.phase_elapsed_s += dt_s;
        }
        changed
    }

    fn compute_green(&self, dir: Direction, queues: QueueCounts) -> f64 {
        green_time(&self.timing, self.mode, queues.get(dir), queues.total())
    }

    /// Whether a vehicle moving in `dir` may enter the intersection.
    pub fn can_pass(&self, dir: Direction) -> bool {
        !self.state.is_yellow && self.state.current_phase == dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(mode: SignalMode) -> SignalController {
        SignalController::new(NodeId(0, 0), mode, SignalTiming::default())
    }

    fn q(ns: u32, ew: u32) -> QueueCounts {
        QueueCounts { ns, ew }
    }

    #[test]
    fn green_time_bounds() {
        let t = SignalTiming::default();
        assert_eq!(green_time(&t, SignalMode::Adaptive, 0, 0), 15.0);
        assert_eq!(green_time(&t, SignalMode::Adaptive, 1, 1), 90.0);
        assert_eq!(green_time(&t, SignalMode::Adaptive, 0, 4), 15.0);
        assert_eq!(green_time(&t, SignalMode::Adaptive, 1, 2), 52.5);
        for q_total in 0..20 {
            for q_phase in 0..=q_total {
                let g = green_time(&t, SignalMode::Adaptive, q_phase, q_total);
                assert!((15.0..=90.0).contains(&g));
            }
        }
    }

    #[test]
    fn fixed_mode_ignores_queues() {
        let t = SignalTiming::default();
        assert_eq!(green_time(&t, SignalMode::Fixed, 10, 10), 15.0);
    }

    #[test]
    fn fixed_cycle_visits_each_phase_for_its_duration() {
        let mut c = controller(SignalMode::Fixed);
        let mut phases = Vec::new();
        for _ in 0..36 {
            c.update(q(0, 0), 1.0);
            phases.push(c.phase());
        }
        let count = |p| phases.iter().filter(|x| **x == p).count();
        assert!(phases[..15].iter().all(|p| *p == SignalPhase::NsGreen));
        assert!(phases[15..18].iter().all(|p| *p == SignalPhase::Yellow));
        assert!(phases[18..33].iter().all(|p| *p == SignalPhase::EwGreen));
        assert!(phases[33..36].iter().all(|p| *p == SignalPhase::Yellow));
        assert_eq!(count(SignalPhase::NsGreen), 15);
    }

    #[test]
    fn initial_green_uses_first_queues() {
        let mut c = controller(SignalMode::Adaptive);
        c.update(q(1, 0), 1.0);
        assert_eq!(c.state().green_duration_s, 90.0);
        assert_eq!(c.phase(), SignalPhase::NsGreen);
    }

    #[test]
    fn adaptive_green_recomputed_on_phase_start() {
        let mut c = controller(SignalMode::Adaptive);
        // No demand: 15 s NS green, then yellow.
        for _ in 0..18 {
            c.update(q(0, 0), 1.0);
        }
        assert_eq!(c.phase(), SignalPhase::Yellow);
        let changed = c.update(q(1, 3), 1.0);
        assert!(changed);
        assert_eq!(c.phase(), SignalPhase::EwGreen);
        assert!((c.state().green_duration_s - (15.0 + 75.0 * 0.75)).abs() < 1e-9);
    }

    #[test]
    fn mutual_exclusion_holds_every_tick() {
        let mut c = controller(SignalMode::Adaptive);
        for t in 0..2000_u32 {
            c.update(q(t % 7, (t / 3) % 5), 1.0);
            let ns = c.can_pass(Direction::NorthSouth);
            let ew = c.can_pass(Direction::EastWest);
            assert!(!(ns && ew));
            if c.state().is_yellow {
                assert!(!ns && !ew);
            } else {
                assert!(ns || ew);
            }
        }
    }

    #[test]
    fn update_reports_transitions() {
        let mut c = controller(SignalMode::Fixed);
        let changes = (0..36).filter(|_| c.update(q(0, 0), 1.0)).count();
        // green→yellow, yellow→EW, EW→yellow
        assert_eq!(changes, 3);
    }

    #[test]
    fn queue_counts_accumulate_by_direction() {
        let mut counts = QueueCounts::default();
        counts.add(Direction::NorthSouth);
        counts.add(Direction::EastWest);
        counts.add(Direction::EastWest);
        assert_eq!(counts.get(Direction::NorthSouth), 1);
        assert_eq!(counts.get(Direction::EastWest), 2);
        assert_eq!(counts.total(), 3);
    }
}
