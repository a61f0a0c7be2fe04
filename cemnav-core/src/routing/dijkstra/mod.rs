mod state;
pub mod traced_dijkstra;

pub use traced_dijkstra::{ShortestPath, shortest_path};
