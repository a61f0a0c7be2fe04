//! Walkable path network for cemetery grounds and shortest-path routing
//! over it.
//!
//! Road geometries are turned into a [`PathNetwork`] once by
//! [`build_network`]; after that every request only borrows the network,
//! snaps its two points into a request-local overlay and runs Dijkstra.

pub mod error;
pub mod format;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod shared;
pub mod spatial;

pub use error::{Error, SnapRole};
pub use format::format_distance;
pub use loading::{NetworkConfig, RoadFeature, build_network};
pub use model::{Coordinate, NetworkStats, PathNetwork};
pub use routing::{Route, RouteOptions, build_routed_polyline, build_routed_polylines};
pub use shared::SharedNetwork;
