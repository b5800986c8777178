//! Trace session pipeline: resolution, subprocess driving, parsing, and
//! the session state machine.

pub mod config;
pub mod driver;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::{TraceConfig, TraceConfigBuilder};
pub use error::TraceError;
pub use parser::{Dialect, HopLineParser};
pub use resolver::resolve_target;
pub use session::{TraceController, TraceEvent, TraceHandle};
pub use types::{Hop, SessionStatus};

/// Prefixes of address ranges that are skipped for geolocation enrichment.
const RESERVED_PREFIXES: &[&str] = &[
    "192.0.0.",  // IETF protocol assignments
    "192.168.",  // private
    "10.",       // private
    "172.16.",   // private
    "127.",      // loopback
    "169.254.",  // link-local
    "224.",      // multicast
    "0.",        // invalid
];

/// Checks whether an IP string falls in a reserved range that should not be
/// geolocated (private, loopback, link-local, multicast, invalid).
///
/// The literal `"Timeout"` sentinel is not reserved; callers must check for
/// it separately before attempting enrichment.
pub fn is_reserved_ip(ip: &str) -> bool {
    if ip == Hop::TIMEOUT {
        return false;
    }
    RESERVED_PREFIXES.iter().any(|prefix| ip.starts_with(prefix))
}
