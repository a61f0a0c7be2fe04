//! This module is responsible for reading road geometry (in-memory features
//! or GeoJSON) and building the routable path network.

mod builder;
mod config;
pub mod ingest;

pub use builder::build_network;
pub use config::NetworkConfig;
pub use ingest::{
    RoadFeature, RoadGeometry, Segment, features_from_geojson_path, features_from_geojson_str,
    segments_from_features,
};
