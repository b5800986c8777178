//! Reverse DNS lookup service

use super::cache::RdnsCache;
use super::reverse::{create_default_resolver, reverse_dns_lookup, ReverseDnsError};
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Reverse DNS lookup service with an internal TTL cache.
#[derive(Debug)]
pub struct RdnsLookup {
    cache: RdnsCache,
    resolver: Arc<TokioResolver>,
}

impl RdnsLookup {
    /// Create a service with the default cache TTL (1 hour).
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    /// Create a service with a custom cache TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: RdnsCache::new(ttl),
            resolver: Arc::new(create_default_resolver()),
        }
    }

    /// Create a service using a specific resolver.
    pub fn with_resolver(resolver: Arc<TokioResolver>) -> Self {
        Self {
            cache: RdnsCache::with_default_ttl(),
            resolver,
        }
    }

    /// Look up the hostname for an IP address, answering from the cache
    /// when possible.
    pub async fn lookup(&self, ip: IpAddr) -> Result<String, ReverseDnsError> {
        if let Some(hostname) = self.cache.get(&ip) {
            return Ok(hostname);
        }
        let hostname = reverse_dns_lookup(ip, &self.resolver).await?;
        self.cache.insert(ip, hostname.clone());
        Ok(hostname)
    }

    /// Remove all cached entries.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Check whether an IP already has a cached hostname.
    pub fn is_cached(&self, ip: &IpAddr) -> bool {
        self.cache.get(ip).is_some()
    }
}

impl Default for RdnsLookup {
    fn default() -> Self {
        Self::new()
    }
}
