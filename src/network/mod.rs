pub mod grid;
pub mod planner;

pub use grid::{Direction, LINK_COST, LinkSpec, NetworkGraph, NodeId};
pub use planner::{RoutePlanner, RoutingMode};
