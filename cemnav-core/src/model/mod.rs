//! Data model for cemetery path routing
//!
//! Contains coordinate handling, the planar frame and the path network.

pub mod coord;
pub mod network;
pub mod projection;

pub use coord::{Coordinate, NodeKey, QUANTIZATION_STEP_DEG};
pub use network::{EdgeKind, NetworkStats, PathEdge, PathGraph, PathNetwork, PathNode};
pub use projection::{LocalProjection, METERS_PER_DEG_LAT, meters_per_deg_lng, planar_distance};
