//! Walkable path network model

pub mod components;
pub mod graph;

pub use components::{EdgeKind, PathEdge, PathNode};
pub use graph::{NetworkStats, PathGraph, PathNetwork};
