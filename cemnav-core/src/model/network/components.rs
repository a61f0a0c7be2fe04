//! Path network components - nodes and edges

use geo::Coord;
use serde::Serialize;

use crate::model::{Coordinate, NodeKey};

/// Path network node
#[derive(Debug, Clone)]
pub struct PathNode {
    /// Stable identity derived from the quantized coordinate
    pub key: NodeKey,
    /// Node coordinates
    pub geometry: Coordinate,
    /// Position in the network's local planar frame, meters
    pub position: Coord<f64>,
}

/// Origin of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Consecutive points of one road feature; holds the feature's index
    Road(usize),
    /// Synthetic connector between close endpoints of different features
    Bridge,
}

/// Path network edge, traversable in both directions
#[derive(Debug, Clone)]
pub struct PathEdge {
    /// Planar length in meters
    pub weight: f64,
    pub kind: EdgeKind,
}

impl PathEdge {
    pub fn length(&self) -> f64 {
        self.weight
    }

    pub fn is_bridge(&self) -> bool {
        self.kind == EdgeKind::Bridge
    }
}
