//! Geolocation lookup service

use super::cache::GeoCache;
use super::client::{GeoClient, GeoError, GeoInfo};
use super::GeoProvider;
use async_trait::async_trait;
use std::time::Duration;

/// Geolocation lookup service with an internal TTL cache.
///
/// This is the [`GeoProvider`] used in production; it answers from the
/// cache when possible and queries the configured endpoint otherwise.
#[derive(Debug)]
pub struct GeoLookup {
    cache: GeoCache,
    client: GeoClient,
}

impl GeoLookup {
    /// Create a service against the default public endpoint.
    pub fn new() -> Self {
        Self {
            cache: GeoCache::with_default_ttl(),
            client: GeoClient::new(),
        }
    }

    /// Create a service against a custom endpoint base URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            cache: GeoCache::with_default_ttl(),
            client: GeoClient::with_endpoint(endpoint),
        }
    }

    /// Create a service with a custom cache TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: GeoCache::new(ttl),
            client: GeoClient::new(),
        }
    }

    /// Remove all cached lookup results.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Check whether an IP already has a cached result.
    pub fn is_cached(&self, ip: &str) -> bool {
        self.cache.get(ip).is_some()
    }
}

#[async_trait]
impl GeoProvider for GeoLookup {
    async fn lookup(&self, ip: &str) -> Result<GeoInfo, GeoError> {
        if let Some(info) = self.cache.get(ip) {
            return Ok(info);
        }
        let info = self.client.lookup(ip).await?;
        self.cache.insert(ip.to_string(), info.clone());
        Ok(info)
    }
}

impl Default for GeoLookup {
    fn default() -> Self {
        Self::new()
    }
}
