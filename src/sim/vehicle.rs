//! Vehicle agent: route following, link occupancy, delay and emissions.

use serde::Serialize;

use crate::error::SimError;
use crate::network::{Direction, LinkSpec, NodeId};

/// Idle emission rate (g CO₂ per second) below [`STOPPED_SPEED_MPS`].
pub const IDLE_EMISSIONS_G_PER_S: f64 = 2.31;
/// Moving emission factor (g CO₂ per meter travelled).
pub const MOVING_EMISSIONS_G_PER_M: f64 = 0.15;
/// Speeds below this count as stopped for queues and emissions.
pub const STOPPED_SPEED_MPS: f64 = 1.0;

/// Time discretization of link traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub dt_s: f64,
    pub link_length_m: f64,
    pub speed_limit_mps: f64,
    /// Ticks a vehicle occupies a link: `ceil(length / (limit · dt))`, at least 1.
    pub ticks_per_link: u32,
}

impl Kinematics {
    pub fn new(link: LinkSpec, dt_s: f64) -> Self {
        let ticks = (link.length_m / (link.speed_limit_mps * dt_s)).ceil();
        Self {
            dt_s,
            link_length_m: link.length_m,
            speed_limit_mps: link.speed_limit_mps,
            ticks_per_link: if ticks.is_finite() && ticks >= 1.0 {
                ticks as u32
            } else {
                1
            },
        }
    }
}

/// Where a vehicle is between intersections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Motion {
    /// Standing at `position`, waiting to enter the next link.
    AtNode,
    /// On the link toward `to`; arrives when `remaining_ticks` hits zero.
    InTransit { to: NodeId, remaining_ticks: u32 },
}

/// What happened to a vehicle during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Reached its destination; no movement, no emissions.
    Completed,
    /// Entered the next link.
    Departed,
    /// Still on a link.
    InTransit,
    /// Registered at the next intersection.
    Arrived,
    /// Held by a red or yellow signal.
    Blocked,
    /// Already completed before this tick.
    Idle,
}

/// Per-tick result returned to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleTick {
    pub outcome: StepOutcome,
    pub emitted_g: f64,
}

/// One vehicle and its accumulated statistics.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: usize,
    route: Vec<NodeId>,
    route_cursor: usize,
    position: NodeId,
    motion: Motion,
    speed_mps: f64,
    travel_time_s: f64,
    delay_s: f64,
    emissions_g: f64,
    distance_m: f64,
    completed: bool,
    completed_tick: Option<usize>,
}

impl Vehicle {
    /// Creates a vehicle standing at the first node of `route`.
    ///
    /// # Errors
    ///
    /// [`SimError::InternalConsistency`] for an empty route.
    pub fn new(id: usize, route: Vec<NodeId>) -> Result<Self, SimError> {
        let Some(&origin) = route.first() else {
            return Err(SimError::consistency(format!("vehicle {id} has an empty route")));
        };
        Ok(Self {
            id,
            route,
            route_cursor: 0,
            position: origin,
            motion: Motion::AtNode,
            speed_mps: 0.0,
            travel_time_s: 0.0,
            delay_s: 0.0,
            emissions_g: 0.0,
            distance_m: 0.0,
            completed: false,
            completed_tick: None,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn origin(&self) -> NodeId {
        self.route[0]
    }

    pub fn destination(&self) -> NodeId {
        self.route[self.route.len() - 1]
    }

    pub fn route(&self) -> &[NodeId] {
        &self.route
    }

    pub fn route_cursor(&self) -> usize {
        self.route_cursor
    }

    pub fn position(&self) -> NodeId {
        self.position
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn travel_time_s(&self) -> f64 {
        self.travel_time_s
    }

    pub fn delay_s(&self) -> f64 {
        self.delay_s
    }

    pub fn emissions_g(&self) -> f64 {
        self.emissions_g
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_tick(&self) -> Option<usize> {
        self.completed_tick
    }

    pub fn is_in_transit(&self) -> bool {
        matches!(self.motion, Motion::InTransit { .. })
    }

    /// Direction of the next hop if the vehicle is standing at an
    /// intersection with somewhere left to go.
    pub fn next_direction(&self) -> Option<Direction> {
        if self.completed || self.is_in_transit() {
            return None;
        }
        let next = self.route.get(self.route_cursor + 1)?;
        Direction::between(self.position, *next)
    }

    /// Stopped at an intersection, waiting to leave toward its next hop.
    pub fn queued_direction(&self) -> Option<Direction> {
        if self.speed_mps >= STOPPED_SPEED_MPS || self.position == self.destination() {
            return None;
        }
        self.next_direction()
    }

    /// Advances the vehicle by one tick.
    ///
    /// `can_pass(node, dir)` reports whether the signal at `node` currently
    /// admits movement in `dir`.
    ///
    /// # Errors
    ///
    /// [`SimError::InternalConsistency`] when the route is exhausted before
    /// the destination or a hop joins non-adjacent intersections.
    pub fn step<F>(&mut self, tick: usize, kin: &Kinematics, can_pass: F) -> Result<VehicleTick, SimError>
    where
        F: Fn(NodeId, Direction) -> bool,
    {
        if self.completed {
            return Ok(VehicleTick {
                outcome: StepOutcome::Idle,
                emitted_g: 0.0,
            });
        }

        let outcome = match self.motion {
            Motion::InTransit {
                to,
                remaining_ticks,
            } => {
                self.speed_mps = kin.speed_limit_mps;
                self.advance_transit(to, remaining_ticks, kin)
            }
            Motion::AtNode if self.position == self.destination() => {
                self.completed = true;
                self.completed_tick = Some(tick);
                self.speed_mps = 0.0;
                return Ok(VehicleTick {
                    outcome: StepOutcome::Completed,
                    emitted_g: 0.0,
                });
            }
            Motion::AtNode => {
                let next = self.next_hop()?;
                let dir = Direction::between(self.position, next).ok_or_else(|| {
                    SimError::consistency(format!(
                        "vehicle {} route hop {} -> {next} is not a link",
                        self.id, self.position
                    ))
                })?;
                if can_pass(self.position, dir) {
                    self.speed_mps = kin.speed_limit_mps;
                    match self.advance_transit(next, kin.ticks_per_link, kin) {
                        StepOutcome::Arrived => StepOutcome::Arrived,
                        _ => StepOutcome::Departed,
                    }
                } else {
                    self.speed_mps = 0.0;
                    self.delay_s += kin.dt_s;
                    StepOutcome::Blocked
                }
            }
        };

        let emitted_g = if self.speed_mps < STOPPED_SPEED_MPS {
            IDLE_EMISSIONS_G_PER_S * kin.dt_s
        } else {
            MOVING_EMISSIONS_G_PER_M * self.speed_mps * kin.dt_s
        };
        self.emissions_g += emitted_g;
        self.travel_time_s += kin.dt_s;

        Ok(VehicleTick { outcome, emitted_g })
    }

    fn next_hop(&self) -> Result<NodeId, SimError> {
        self.route.get(self.route_cursor + 1).copied().ok_or_else(|| {
            SimError::consistency(format!(
                "vehicle {} exhausted its route at {} before reaching {}",
                self.id,
                self.position,
                self.destination()
            ))
        })
    }

    /// Spends one tick of a link traversal that had `remaining_ticks` left.
    fn advance_transit(&mut self, to: NodeId, remaining_ticks: u32, kin: &Kinematics) -> StepOutcome {
        let remaining = remaining_ticks.saturating_sub(1);
        if remaining == 0 {
            self.position = to;
            self.route_cursor += 1;
            self.distance_m += kin.link_length_m;
            self.motion = Motion::AtNode;
            StepOutcome::Arrived
        } else {
            self.motion = Motion::InTransit {
                to,
                remaining_ticks: remaining,
            };
            StepOutcome::InTransit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kin() -> Kinematics {
        Kinematics::new(LinkSpec::default(), 1.0)
    }

    fn always(_: NodeId, _: Direction) -> bool {
        true
    }

    fn never(_: NodeId, _: Direction) -> bool {
        false
    }

    #[test]
    fn default_link_takes_thirty_six_ticks() {
        assert_eq!(kin().ticks_per_link, 36);
        let short = Kinematics::new(
            LinkSpec {
                length_m: 10.0,
                speed_limit_mps: 13.9,
            },
            1.0,
        );
        assert_eq!(short.ticks_per_link, 1);
    }

    #[test]
    fn clear_path_arrives_after_link_ticks_then_completes() {
        let k = kin();
        let mut v = Vehicle::new(0, vec![NodeId(0, 0), NodeId(0, 1)]).expect("route");
        let first = v.step(0, &k, always).expect("step");
        assert_eq!(first.outcome, StepOutcome::Departed);
        for t in 1..35 {
            assert_eq!(v.step(t, &k, always).expect("step").outcome, StepOutcome::InTransit);
        }
        assert_eq!(v.step(35, &k, always).expect("step").outcome, StepOutcome::Arrived);
        assert_eq!(v.position(), NodeId(0, 1));
        assert_eq!(v.route_cursor(), 1);
        assert_eq!(v.distance_m(), 500.0);
        assert!(!v.is_completed());

        let done = v.step(36, &k, always).expect("step");
        assert_eq!(done.outcome, StepOutcome::Completed);
        assert_eq!(done.emitted_g, 0.0);
        assert!(v.is_completed());
        assert_eq!(v.completed_tick(), Some(36));
        assert_eq!(v.travel_time_s(), 36.0);
        assert_eq!(v.delay_s(), 0.0);
    }

    #[test]
    fn blocked_vehicle_idles_and_accumulates_delay() {
        let k = kin();
        let mut v = Vehicle::new(1, vec![NodeId(0, 0), NodeId(1, 0)]).expect("route");
        for t in 0..5 {
            let tick = v.step(t, &k, never).expect("step");
            assert_eq!(tick.outcome, StepOutcome::Blocked);
            assert!((tick.emitted_g - 2.31).abs() < 1e-12);
        }
        assert_eq!(v.delay_s(), 5.0);
        assert_eq!(v.travel_time_s(), 5.0);
        assert_eq!(v.speed_mps(), 0.0);
        assert_eq!(v.queued_direction(), Some(Direction::EastWest));
    }

    #[test]
    fn moving_emissions_scale_with_speed() {
        let k = kin();
        let mut v = Vehicle::new(2, vec![NodeId(0, 0), NodeId(0, 1)]).expect("route");
        let tick = v.step(0, &k, always).expect("step");
        assert!((tick.emitted_g - 0.15 * 13.9).abs() < 1e-12);
    }

    #[test]
    fn signal_is_queried_in_hop_direction() {
        let k = kin();
        let mut v = Vehicle::new(3, vec![NodeId(2, 2), NodeId(2, 3)]).expect("route");
        let ns_only = |node: NodeId, dir: Direction| node == NodeId(2, 2) && dir == Direction::NorthSouth;
        assert_eq!(v.step(0, &k, ns_only).expect("step").outcome, StepOutcome::Departed);

        let mut w = Vehicle::new(4, vec![NodeId(2, 2), NodeId(3, 2)]).expect("route");
        assert_eq!(w.step(0, &k, ns_only).expect("step").outcome, StepOutcome::Blocked);
    }

    #[test]
    fn in_transit_vehicle_ignores_signals() {
        let k = kin();
        let mut v = Vehicle::new(5, vec![NodeId(0, 0), NodeId(0, 1), NodeId(0, 2)]).expect("route");
        v.step(0, &k, always).expect("step");
        assert_eq!(v.step(1, &k, never).expect("step").outcome, StepOutcome::InTransit);
        assert_eq!(v.delay_s(), 0.0);
        assert_eq!(v.next_direction(), None);
    }

    #[test]
    fn non_adjacent_hop_is_consistency_error() {
        let k = kin();
        let mut v = Vehicle::new(6, vec![NodeId(0, 0), NodeId(2, 0)]).expect("route");
        let err = v.step(0, &k, always);
        assert!(matches!(err, Err(SimError::InternalConsistency(_))));
    }

    #[test]
    fn empty_route_rejected() {
        assert!(matches!(
            Vehicle::new(7, Vec::new()),
            Err(SimError::InternalConsistency(_))
        ));
    }

    #[test]
    fn completed_vehicle_stays_completed() {
        let k = kin();
        let mut v = Vehicle::new(8, vec![NodeId(1, 1)]).expect("route");
        assert_eq!(v.step(0, &k, always).expect("step").outcome, StepOutcome::Completed);
        let after = v.step(1, &k, always).expect("step");
        assert_eq!(after.outcome, StepOutcome::Idle);
        assert!(v.is_completed());
        assert_eq!(v.travel_time_s(), 0.0);
    }
}
