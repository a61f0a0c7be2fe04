// Re-export key components
pub use crate::loading::{
    NetworkConfig, RoadFeature, RoadGeometry, build_network, features_from_geojson_path,
    features_from_geojson_str,
};
pub use crate::model::{Coordinate, NetworkStats, PathNetwork};
pub use crate::routing::{Route, RouteOptions, build_routed_polyline, build_routed_polylines};
pub use crate::shared::SharedNetwork;

pub use crate::format::format_distance;
pub use crate::{Error, SnapRole};
