//! Core types for trace sessions

use serde::{Deserialize, Serialize};

/// One traceroute measurement, as parsed from a single hop line.
///
/// String fields use sentinel values rather than options so that a hop can
/// always be displayed: `host` is `"Timeout"`/`"Unknown"` and `ip` is
/// `"Timeout"` when the corresponding data never arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    /// 1-based hop number as reported by the trace utility. May repeat if
    /// the utility re-probes a hop; entries are kept in arrival order.
    pub hop: u32,
    /// Resolved hostname, or `"Unknown"`/`"Timeout"`.
    pub host: String,
    /// Dotted IPv4 address, or `"Timeout"` when no probe was answered.
    pub ip: String,
    /// Average of the probe round-trip times on the line, in milliseconds.
    /// `0.0` when no probe reported a time.
    pub rtt_ms: f64,
}

impl Hop {
    /// Sentinel used for `host` and `ip` when all probes for a hop timed out.
    pub const TIMEOUT: &'static str = "Timeout";
    /// Sentinel used for `host` when no name could be determined.
    pub const UNKNOWN_HOST: &'static str = "Unknown";

    /// Whether this hop received no reply at all.
    pub fn is_timeout(&self) -> bool {
        self.ip == Self::TIMEOUT
    }

    /// Whether this hop's hostname is still the unresolved sentinel.
    pub fn host_unresolved(&self) -> bool {
        self.host == Self::UNKNOWN_HOST || self.host == Self::TIMEOUT
    }
}

/// Lifecycle state of a trace session.
///
/// A session starts in `Resolving`, moves to `Tracing` once the subprocess
/// is running, and ends in exactly one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Resolving the target to an IPv4 address.
    Resolving,
    /// The trace subprocess is running and hops are being collected.
    Tracing,
    /// The subprocess output stream closed normally.
    Completed,
    /// Resolution or the subprocess failed; partial hops remain valid.
    Failed,
    /// The session was cancelled by the caller.
    Cancelled,
}

impl SessionStatus {
    /// Whether this is a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Resolving => "resolving",
            SessionStatus::Tracing => "tracing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}
