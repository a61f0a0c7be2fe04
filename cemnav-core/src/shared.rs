//! Swappable handle to the network currently used for routing.

use std::sync::Arc;

use log::info;
use parking_lot::RwLock;

use crate::model::PathNetwork;

/// Holds the current [`PathNetwork`] behind an `Arc`.
///
/// Readers take a snapshot with [`SharedNetwork::current`] and route on it
/// without holding any lock. A refresh builds the next network elsewhere and
/// installs it with [`SharedNetwork::replace`]; requests that already hold a
/// snapshot finish on the old one.
#[derive(Debug)]
pub struct SharedNetwork {
    current: RwLock<Arc<PathNetwork>>,
}

impl SharedNetwork {
    pub fn new(network: PathNetwork) -> Self {
        Self {
            current: RwLock::new(Arc::new(network)),
        }
    }

    pub fn current(&self) -> Arc<PathNetwork> {
        Arc::clone(&self.current.read())
    }

    /// Installs `network` and returns the one it replaced.
    pub fn replace(&self, network: PathNetwork) -> Arc<PathNetwork> {
        let next = Arc::new(network);
        info!(
            "Swapping in network with {} nodes and {} edges",
            next.node_count(),
            next.edge_count()
        );
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl From<PathNetwork> for SharedNetwork {
    fn from(network: PathNetwork) -> Self {
        Self::new(network)
    }
}
