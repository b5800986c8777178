//! Error types for trace sessions

use thiserror::Error;

/// Errors that end a trace session before or instead of a normal completion.
///
/// Parse anomalies are deliberately absent: a line the parser cannot make
/// sense of is noise, not an error. Enrichment failures are likewise
/// per-hop and never fatal; they surface as failed enrichment results.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The target hostname could not be resolved to an IPv4 address.
    #[error("Failed to resolve host: {0}")]
    Resolution(String),

    /// The target is loopback, private, or the local machine itself.
    ///
    /// Such targets produce no usable route, so no subprocess is spawned.
    #[error("Tracing local/private targets like {0} is not supported")]
    UnsupportedTarget(String),

    /// The trace subprocess failed to spawn or exited abnormally before
    /// producing any parseable output.
    #[error("Trace process error: {0}")]
    Process(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// General trace session error.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TraceError::Resolution("no.such.host".to_string());
        assert!(err.to_string().contains("no.such.host"));

        let err = TraceError::UnsupportedTarget("192.168.1.5".to_string());
        assert!(err.to_string().contains("not supported"));

        let err = TraceError::Process("spawn failed".to_string());
        assert!(err.to_string().contains("spawn failed"));
    }
}
