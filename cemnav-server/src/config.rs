use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cemnav_core::{Error, NetworkConfig, RouteOptions};
use serde::Deserialize;

/// Server settings, read from a TOML file.
///
/// ```toml
/// [server]
/// bind = "127.0.0.1:8080"
///
/// [network]
/// geometry_path = "roads.geojson"
/// k = 4
/// max_dist = 80.0
///
/// [routing]
/// start_radius = 25.0
/// dest_radius = 25.0
///
/// [limits]
/// timeout_secs = 10
/// concurrency = 64
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub network: NetworkSection,
    pub routing: RouteOptions,
    pub limits: LimitsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub geometry_path: PathBuf,
    #[serde(flatten)]
    pub build: NetworkConfig,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            geometry_path: PathBuf::from("roads.geojson"),
            build: NetworkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub timeout_secs: u64,
    pub concurrency: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            concurrency: 64,
        }
    }
}

impl LimitsSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.network.build.validate()?;
        for (name, radius) in [
            ("start_radius", self.routing.start_radius),
            ("dest_radius", self.routing.dest_radius),
        ] {
            if !radius.is_finite() || radius < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a finite, non-negative distance, got {radius}"
                )));
            }
        }
        if self.limits.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.limits.timeout_secs == 0 {
            return Err(Error::InvalidConfig("timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
