//! Static grid topology: intersections, adjacency, and distance queries.

use std::fmt;

use serde::Serialize;

use crate::config::ConfigError;
use crate::error::SimError;

/// Grid coordinates `(i, j)` of an intersection.
///
/// `i` runs along the x axis (east-west), `j` along the y axis (north-south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize, pub usize);

impl NodeId {
    /// Column index along the x axis.
    pub fn i(self) -> usize {
        self.0
    }

    /// Row index along the y axis.
    pub fn j(self) -> usize {
        self.1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Movement axis through an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Displacement along `j` (y axis).
    NorthSouth,
    /// Displacement along `i` (x axis).
    EastWest,
}

impl Direction {
    /// The crossing direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::NorthSouth => Self::EastWest,
            Self::EastWest => Self::NorthSouth,
        }
    }

    /// Direction of the hop `from → to`, or `None` unless the two are
    /// Manhattan-adjacent.
    pub fn between(from: NodeId, to: NodeId) -> Option<Self> {
        match (from.i().abs_diff(to.i()), from.j().abs_diff(to.j())) {
            (0, 1) => Some(Self::NorthSouth),
            (1, 0) => Some(Self::EastWest),
            _ => None,
        }
    }
}

/// Planning cost of traversing any link.
pub const LINK_COST: u32 = 1;

/// Physical properties shared by every link in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkSpec {
    /// Link length in meters.
    pub length_m: f64,
    /// Posted speed limit in m/s.
    pub speed_limit_mps: f64,
}

impl Default for LinkSpec {
    fn default() -> Self {
        Self {
            length_m: 500.0,
            speed_limit_mps: 13.9,
        }
    }
}

/// Square grid of intersections joined by 4-neighbour links.
///
/// Immutable after construction. Node ids outside the grid are contract
/// violations and panic.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    size: usize,
    spacing_m: f64,
    link: LinkSpec,
    adjacency: Vec<Vec<NodeId>>,
}

impl NetworkGraph {
    /// Builds a `size × size` grid with intersections `spacing_m` apart.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] when the grid has fewer than two
    /// intersections per side or the spacing/link parameters are not positive.
    pub fn new(size: usize, spacing_m: f64, link: LinkSpec) -> Result<Self, SimError> {
        let mut errors = Vec::new();
        if size < 2 {
            errors.push(ConfigError::new("network.grid_size", "must be >= 2"));
        }
        if !(spacing_m > 0.0) {
            errors.push(ConfigError::new("network.spacing_m", "must be > 0"));
        }
        if !(link.length_m > 0.0) {
            errors.push(ConfigError::new("network.link_length_m", "must be > 0"));
        }
        if !(link.speed_limit_mps > 0.0) {
            errors.push(ConfigError::new("network.speed_limit_mps", "must be > 0"));
        }
        if !errors.is_empty() {
            return Err(SimError::Configuration(errors));
        }

        let mut adjacency = vec![Vec::with_capacity(4); size * size];
        for i in 0..size {
            for j in 0..size {
                let candidates = [
                    (Some(i), j.checked_add(1)),
                    (Some(i), j.checked_sub(1)),
                    (i.checked_add(1), Some(j)),
                    (i.checked_sub(1), Some(j)),
                ];
                for (ni, nj) in candidates {
                    let (Some(ni), Some(nj)) = (ni, nj) else {
                        continue;
                    };
                    if ni >= size || nj >= size {
                        continue;
                    }
                    adjacency[i * size + j].push(NodeId(ni, nj));
                }
            }
        }

        Ok(Self {
            size,
            spacing_m,
            link,
            adjacency,
        })
    }

    /// Intersections per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of intersections.
    pub fn node_count(&self) -> usize {
        self.size * self.size
    }

    /// Shared link parameters.
    pub fn link_spec(&self) -> LinkSpec {
        self.link
    }

    /// Dense index of `node` (`i * size + j`).
    ///
    /// # Panics
    ///
    /// Panics if `node` lies outside the grid.
    pub fn index(&self, node: NodeId) -> usize {
        self.assert_in_grid(node);
        node.i() * self.size + node.j()
    }

    fn assert_in_grid(&self, node: NodeId) {
        assert!(
            node.i() < self.size && node.j() < self.size,
            "node {node} outside {0}x{0} grid",
            self.size
        );
    }

    /// Inverse of [`NetworkGraph::index`].
    pub fn node_at(&self, index: usize) -> NodeId {
        assert!(index < self.node_count(), "node index {index} out of range");
        NodeId(index / self.size, index % self.size)
    }

    /// Iterates intersections in index order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count()).map(|idx| self.node_at(idx))
    }

    /// Adjacent intersections (up to 4, fewer at the boundary).
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.adjacency[self.index(node)]
    }

    /// `|Δi| + |Δj|` between two intersections.
    pub fn manhattan_distance(&self, a: NodeId, b: NodeId) -> u32 {
        self.assert_in_grid(a);
        self.assert_in_grid(b);
        (a.i().abs_diff(b.i()) + a.j().abs_diff(b.j())) as u32
    }

    /// Physical position `(x, y)` in meters.
    pub fn coordinates(&self, node: NodeId) -> (f64, f64) {
        self.assert_in_grid(node);
        (
            node.i() as f64 * self.spacing_m,
            node.j() as f64 * self.spacing_m,
        )
    }
}
