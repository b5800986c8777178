//! Reverse DNS lookup caching

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    hostname: String,
    inserted_at: Instant,
}

/// Thread-safe TTL cache for reverse DNS lookups
#[derive(Debug)]
pub struct RdnsCache {
    entries: Mutex<HashMap<IpAddr, CacheEntry>>,
    ttl: Duration,
}

impl RdnsCache {
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
    pub fn get(&self, ip: &IpAddr) -> Option<String> {
        let mut entries = self.entries.lock().expect("mutex poisoned");
        if let Some(entry) = entries.get(ip) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.hostname.clone());
            }
            entries.remove(ip);
        }
        None
    }

    /// Insert a hostname
    pub fn insert(&self, ip: IpAddr, hostname: String) {
        let mut entries = self.entries.lock().expect("mutex poisoned");
        entries.insert(
            ip,
            CacheEntry {
                hostname,
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

impl Default for RdnsCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(8, 8, 8, last))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = RdnsCache::with_default_ttl();
        cache.insert(ip(8), "dns.google".to_string());

        assert_eq!(cache.get(&ip(8)), Some("dns.google".to_string()));
        assert_eq!(cache.get(&ip(4)), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expiry_evicts_on_read() {
        let cache = RdnsCache::new(Duration::from_millis(10));
        cache.insert(ip(8), "dns.google".to_string());

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&ip(8)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = RdnsCache::with_default_ttl();
        cache.insert(ip(8), "dns.google".to_string());
        cache.clear();
        assert!(cache.is_empty());
    }
}
