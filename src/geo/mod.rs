//! Geolocation enrichment services
//!
//! A hop IP is enriched by querying an ip-api.com style JSON endpoint.
//! The [`GeoProvider`] trait is the seam between the enrichment workers
//! and the actual service, so tests can substitute a stub.

pub mod cache;
pub mod client;
pub mod service;

pub use cache::GeoCache;
pub use client::{GeoClient, GeoError, GeoInfo};
pub use service::GeoLookup;

use async_trait::async_trait;

/// Source of geolocation data for an IP address.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Look up geographic metadata for a dotted IPv4 string.
    async fn lookup(&self, ip: &str) -> Result<GeoInfo, GeoError>;
}
