pub mod dijkstra;
pub mod itinerary;
pub mod snap;

pub use dijkstra::{ShortestPath, shortest_path};
pub use itinerary::{Route, RouteOptions, build_routed_polyline, build_routed_polylines};
pub use snap::{NODE_MATCH_TOLERANCE, Overlay, SnapKind, SnapPoint, Vertex};
