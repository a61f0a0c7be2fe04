use serde::{Deserialize, Serialize};

use crate::Error;

/// Parameters for turning road geometry into a routable network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bridge candidates examined per node
    pub k: usize,
    /// Largest gap, in meters, that a bridge edge may span
    pub max_dist: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            k: 4,
            max_dist: 80.0,
        }
    }
}

impl NetworkConfig {
    pub fn new(k: usize, max_dist: f64) -> Self {
        Self { k, max_dist }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.max_dist.is_finite() || self.max_dist < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_dist must be a finite, non-negative distance, got {}",
                self.max_dist
            )));
        }
        Ok(())
    }
}
