//! Reverse DNS lookup services
//!
//! Hops whose output line carries no hostname fall back to a PTR lookup.
//! Failures here are never fatal; the hop simply keeps its sentinel name.

pub mod cache;
pub mod reverse;
pub mod service;

pub use cache::RdnsCache;
pub use reverse::{reverse_dns_lookup, ReverseDnsError};
pub use service::RdnsLookup;
