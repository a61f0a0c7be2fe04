use std::path::Path;

use cemnav_core::{
    Error, NetworkConfig, NetworkStats, PathNetwork, SharedNetwork, build_network,
    loading::features_from_geojson_path,
};
use tracing::info;

use crate::config::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub network: SharedNetwork,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(network: PathNetwork, config: ServerConfig) -> Self {
        Self {
            network: SharedNetwork::new(network),
            config,
        }
    }

    /// Rebuilds the network from the configured geometry file and swaps it
    /// in. Blocking; call from a blocking task.
    pub fn reload(&self) -> Result<NetworkStats, Error> {
        let network = load_network(&self.config.network.geometry_path, &self.config.network.build)?;
        let stats = network.stats();
        self.network.replace(network);
        Ok(stats)
    }
}

pub fn load_network(path: &Path, config: &NetworkConfig) -> Result<PathNetwork, Error> {
    info!(path = %path.display(), "Loading road geometry");
    let features = features_from_geojson_path(path)?;
    build_network(&features, config)
}
