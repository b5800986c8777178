//! Service container for the tracemap library
//!
//! Bundles the network services a trace session consumes (reverse DNS and
//! geolocation). Services are thread-safe internally, so no outer locking
//! is needed; cloning the container shares the same instances.

use crate::dns::RdnsLookup;
use crate::geo::GeoLookup;
use std::sync::Arc;

/// Container for the services used by trace sessions
#[derive(Clone, Debug)]
pub struct Services {
    /// Reverse DNS lookup service
    pub rdns: Arc<RdnsLookup>,
    /// Geolocation lookup service
    pub geo: Arc<GeoLookup>,
}

impl Services {
    /// Create services with default configuration
    pub fn new() -> Self {
        Self {
            rdns: Arc::new(RdnsLookup::new()),
            geo: Arc::new(GeoLookup::new()),
        }
    }

    /// Create services with optional custom implementations
    ///
    /// Any service not provided is created with default configuration.
    pub fn with_services(rdns: Option<RdnsLookup>, geo: Option<GeoLookup>) -> Self {
        Self {
            rdns: Arc::new(rdns.unwrap_or_default()),
            geo: Arc::new(geo.unwrap_or_default()),
        }
    }

    /// Clear the caches of all services
    pub fn clear_all_caches(&self) {
        self.rdns.clear_cache();
        self.geo.clear_cache();
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new()
    }
}
