//! tracemap - streaming system-traceroute with per-hop geolocation
//!
//! This library drives the platform trace utility (`tracert` on Windows,
//! `traceroute` elsewhere) as a subprocess, parses its output into hops as
//! lines arrive, and enriches each routable hop address with geographic
//! metadata looked up concurrently. Consumers observe a typed event
//! stream; sessions support cooperative cancellation with a bounded
//! termination grace period.

pub mod dns;
pub mod enrich;
pub mod geo;
pub mod services;
pub mod trace;

// Re-export core types for library users
pub use enrich::{EnrichmentResult, EnrichmentStatus};
pub use geo::{GeoInfo, GeoProvider};
pub use services::Services;
pub use trace::{
    is_reserved_ip, Hop, SessionStatus, TraceConfig, TraceController, TraceError, TraceEvent,
    TraceHandle,
};

/// Run a trace to completion with default configuration and return the
/// ordered hop list. For streaming consumption, use [`TraceController`].
pub async fn trace(target: &str) -> Result<Vec<Hop>, TraceError> {
    let mut controller = TraceController::new();
    let mut handle = controller
        .start_trace(target, TraceConfig::default())
        .await?;

    let mut failure: Option<String> = None;
    while let Some(event) = handle.next_event().await {
        match event {
            TraceEvent::Completed(hops) => return Ok(hops),
            TraceEvent::Error(message) => failure = Some(message),
            _ => {}
        }
    }

    Err(TraceError::Other(failure.unwrap_or_else(|| {
        "session ended without a result".to_string()
    })))
}
