use std::fmt;

use thiserror::Error;

/// Which end of a routing request failed to attach to the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapRole {
    Start,
    Destination,
}

impl fmt::Display for SnapRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapRole::Start => f.write_str("start"),
            SnapRole::Destination => f.write_str("destination"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("No path within {radius} m of the {role} point")]
    NoReachablePoint { role: SnapRole, radius: f64 },
    #[error("Start and destination are not connected by any path")]
    NoRoute,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}

impl Error {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidGeometry(_) => "invalid_geometry",
            Error::NoReachablePoint { .. } => "no_reachable_point",
            Error::NoRoute => "no_route",
            Error::InvalidConfig(_) => "invalid_config",
            Error::GeoJson(_) => "geojson",
            Error::IoError(_) => "io",
            Error::InternalInvariant(_) => "internal",
        }
    }
}
