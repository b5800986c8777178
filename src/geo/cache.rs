//! Geolocation result caching

use super::client::GeoInfo;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    info: GeoInfo,
    inserted_at: Instant,
}

/// Thread-safe TTL cache for geolocation lookups, keyed by IP string.
///
/// Repeated hops across sessions often share addresses; caching keeps the
/// per-hop single-shot lookup contract while avoiding duplicate queries.
#[derive(Debug)]
pub struct GeoCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl GeoCache {
    /// Create a new cache with the specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a new cache with the default TTL (1 hour)
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(3600))
    }

    /// Look up an IP in the cache, dropping the entry if it has expired
    pub fn get(&self, ip: &str) -> Option<GeoInfo> {
        let mut entries = self.entries.lock().expect("mutex poisoned");
        if let Some(entry) = entries.get(ip) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.info.clone());
            }
            entries.remove(ip);
        }
        None
    }

    /// Insert a lookup result
    pub fn insert(&self, ip: String, info: GeoInfo) {
        let mut entries = self.entries.lock().expect("mutex poisoned");
        entries.insert(
            ip,
            CacheEntry {
                info,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().expect("mutex poisoned").len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("mutex poisoned").is_empty()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.lock().expect("mutex poisoned").clear();
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}
