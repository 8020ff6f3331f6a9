//! A* shortest paths and stochastic alternate routes over the grid.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{LINK_COST, NetworkGraph, NodeId};
use crate::error::PlanningError;

/// Default upper bound of the per-neighbour weight jitter.
pub const DEFAULT_JITTER: f64 = 0.3;

/// Step cap multiplier for stochastic generation, applied to the start-goal
/// Manhattan distance.
const STEP_CAP_FACTOR: usize = 4;

/// How each vehicle's route is chosen at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingMode {
    /// Always the A* shortest path.
    Shortest,
    /// One stochastic alternate, falling back to A* when generation fails.
    StochasticAlternate,
    /// Uniform choice among the A* path and a handful of alternates.
    Mixed,
}

impl RoutingMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Shortest => "shortest",
            Self::StochasticAlternate => "stochastic-alternate",
            Self::Mixed => "mixed",
        }
    }
}

/// Route planner borrowing an immutable network.
///
/// All randomness comes from the generator passed to each call, so a seeded
/// generator reproduces the same routes.
#[derive(Debug, Clone, Copy)]
pub struct RoutePlanner<'a> {
    network: &'a NetworkGraph,
    jitter: f64,
}

impl<'a> RoutePlanner<'a> {
    /// Creates a planner with the given weight jitter upper bound.
    pub fn new(network: &'a NetworkGraph, jitter: f64) -> Self {
        Self {
            network,
            jitter: jitter.max(0.0),
        }
    }

    /// Minimum-hop path from `start` to `goal`, both ends included.
    ///
    /// Frontier entries are ordered by `f = g + h` with the Manhattan
    /// distance as `h`; equal `f` values pop in insertion order.
    ///
    /// # Errors
    ///
    /// [`PlanningError::NoPathFound`] if the frontier empties first.
    pub fn shortest_path(&self, start: NodeId, goal: NodeId) -> Result<Vec<NodeId>, PlanningError> {
        let net = self.network;
        let n = net.node_count();
        let start_idx = net.index(start);
        let goal_idx = net.index(goal);

        let mut g_score = vec![u32::MAX; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut frontier: BinaryHeap<Reverse<(u32, u64, u32, usize)>> = BinaryHeap::new();
        let mut seq = 0_u64;

        g_score[start_idx] = 0;
        frontier.push(Reverse((net.manhattan_distance(start, goal), seq, 0, start_idx)));

        while let Some(Reverse((_, _, g, current))) = frontier.pop() {
            if current == goal_idx {
                return Ok(self.reconstruct(&parent, start_idx, goal_idx));
            }
            if g > g_score[current] {
                continue;
            }
            let node = net.node_at(current);
            for &next in net.neighbors(node) {
                let next_idx = net.index(next);
                let tentative = g + LINK_COST;
                if tentative < g_score[next_idx] {
                    g_score[next_idx] = tentative;
                    parent[next_idx] = Some(current);
                    seq += 1;
                    let f = tentative + net.manhattan_distance(next, goal);
                    frontier.push(Reverse((f, seq, tentative, next_idx)));
                }
            }
        }

        Err(PlanningError::NoPathFound {
            from: start,
            to: goal,
        })
    }

    fn reconstruct(&self, parent: &[Option<usize>], start: usize, goal: usize) -> Vec<NodeId> {
        let mut path = vec![self.network.node_at(goal)];
        let mut cursor = goal;
        while cursor != start {
            match parent[cursor] {
                Some(p) => {
                    path.push(self.network.node_at(p));
                    cursor = p;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Random walk biased toward `goal`.
    ///
    /// At every step each neighbour not already on the route gets weight
    /// `1 / (d + 1) + ξ`, `d` its Manhattan distance to the goal and `ξ`
    /// drawn fresh from `[0, jitter)`; the next hop is sampled from the
    /// normalized weights.
    ///
    /// # Errors
    ///
    /// [`PlanningError::RouteGenerationFailed`] after `4 × d(start, goal)`
    /// steps, or when every neighbour is already on the route.
    pub fn alternate_route<R: Rng + ?Sized>(
        &self,
        start: NodeId,
        goal: NodeId,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, PlanningError> {
        let net = self.network;
        if start == goal {
            return Ok(vec![start]);
        }

        let cap = STEP_CAP_FACTOR * net.manhattan_distance(start, goal) as usize;
        let mut on_route = vec![false; net.node_count()];
        let mut route = vec![start];
        on_route[net.index(start)] = true;
        let mut current = start;
        let mut weights = Vec::with_capacity(4);

        for step in 0..cap {
            let neighbors = net.neighbors(current);
            weights.clear();
            for &n in neighbors {
                if on_route[net.index(n)] {
                    weights.push(0.0);
                } else {
                    let d = f64::from(net.manhattan_distance(n, goal));
                    weights.push(1.0 / (d + 1.0) + rng.random::<f64>() * self.jitter);
                }
            }

            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                return Err(PlanningError::RouteGenerationFailed {
                    from: start,
                    to: goal,
                    steps: step,
                });
            }

            let next = neighbors[sample_normalized(&weights, total, rng)];
            route.push(next);
            on_route[net.index(next)] = true;
            current = next;
            if current == goal {
                return Ok(route);
            }
        }

        Err(PlanningError::RouteGenerationFailed {
            from: start,
            to: goal,
            steps: cap,
        })
    }

    /// Alternate route, or the A* path when generation fails.
    ///
    /// # Errors
    ///
    /// Only if the A* fallback itself fails.
    pub fn stochastic_route<R: Rng + ?Sized>(
        &self,
        start: NodeId,
        goal: NodeId,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, PlanningError> {
        match self.alternate_route(start, goal, rng) {
            Ok(route) => Ok(route),
            Err(e) => {
                log::debug!("{e}; falling back to shortest path");
                self.shortest_path(start, goal)
            }
        }
    }

    /// Candidate set: the A* path followed by up to `count - 1` successful
    /// alternates longer than two nodes.
    ///
    /// # Errors
    ///
    /// Only if A* fails.
    pub fn candidate_routes<R: Rng + ?Sized>(
        &self,
        start: NodeId,
        goal: NodeId,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<NodeId>>, PlanningError> {
        let mut routes = vec![self.shortest_path(start, goal)?];
        for _ in 1..count {
            if let Ok(route) = self.alternate_route(start, goal, rng) {
                if route.len() > 2 {
                    routes.push(route);
                }
            }
        }
        Ok(routes)
    }

    /// Plans one route according to `mode`.
    ///
    /// # Errors
    ///
    /// Propagates A* failures; stochastic failures fall back to A*.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        mode: RoutingMode,
        start: NodeId,
        goal: NodeId,
        alternatives: usize,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, PlanningError> {
        match mode {
            RoutingMode::Shortest => self.shortest_path(start, goal),
            RoutingMode::StochasticAlternate => self.stochastic_route(start, goal, rng),
            RoutingMode::Mixed => {
                let mut routes = self.candidate_routes(start, goal, alternatives.max(1), rng)?;
                let pick = rng.random_range(0..routes.len());
                Ok(routes.swap_remove(pick))
            }
        }
    }
}

/// Index drawn from `weights / total`.
fn sample_normalized<R: Rng + ?Sized>(weights: &[f64], total: f64, rng: &mut R) -> usize {
    let u: f64 = rng.random();
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (idx, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        last_positive = idx;
        cumulative += w / total;
        if u < cumulative {
            return idx;
        }
    }
    last_positive
}
