//! The endpoints created during this run.
//!
//! This is the only record of what has to be cleaned up on shutdown.
//! Teardown drains it, so every endpoint is removed exactly once no matter
//! how many exit paths end up calling [`EndpointRegistry::teardown`].

use tracing::{info, warn};

use crate::endpoint::VirtualEndpoint;

/// The set of active endpoints.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<VirtualEndpoint>,
}

impl EndpointRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly published endpoint.
    pub fn register(&mut self, endpoint: VirtualEndpoint) {
        self.endpoints.push(endpoint);
    }

    /// The endpoints, in the order they were registered.
    pub fn iter(&self) -> impl Iterator<Item = &VirtualEndpoint> {
        self.endpoints.iter()
    }

    /// Number of active endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// True if nothing is registered (anymore).
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Remove every public path and close every endpoint.
    ///
    /// Best effort: a path which can't be removed is logged and the rest are still handled.
    /// Calling this again afterwards does nothing.
    /// Returns how many public paths were actually removed.
    pub fn teardown(&mut self) -> usize {
        if self.endpoints.is_empty() {
            return 0;
        }

        info!("Cleaning up {} endpoint(s)", self.endpoints.len());

        let mut removed = 0;

        for endpoint in self.endpoints.drain(..) {
            match endpoint.unpublish() {
                Ok(true) => {
                    info!(link = ?endpoint.link(), "Removed");
                    removed += 1;
                }
                Ok(false) => {
                    warn!(link = ?endpoint.link(), "Already gone");
                }
                Err(e) => {
                    warn!(link = ?endpoint.link(), ?e, "Could not remove");
                }
            }
        }

        removed
    }
}

impl Drop for EndpointRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}
