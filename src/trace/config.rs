//! Configuration for trace sessions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default endpoint for geolocation lookups (ip-api.com JSON API).
pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";

/// Configuration for a trace session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Maximum number of hops to probe (default: 20)
    pub max_hops: u32,
    /// Per-probe wait timeout passed to the trace utility (default: 1s)
    pub probe_timeout: Duration,
    /// How long to wait for the subprocess to die after a cancel before
    /// giving up on reaping it (default: 1s)
    pub grace_period: Duration,
    /// How long to keep draining in-flight enrichment lookups after the
    /// trace itself has completed (default: 3s)
    pub enrichment_grace: Duration,
    /// Perform reverse DNS lookups for hops without a hostname (default: true)
    pub enable_rdns: bool,
    /// Perform geolocation enrichment for routable hop IPs (default: true)
    pub enable_geo: bool,
    /// Base URL of the geolocation JSON endpoint
    pub geo_endpoint: String,
    /// Replace the platform trace command entirely (program followed by
    /// arguments; the target is appended). Used by tests to drive the
    /// session with a scripted subprocess.
    pub command_override: Option<Vec<String>>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_hops: 20,
            probe_timeout: Duration::from_millis(1000),
            grace_period: Duration::from_secs(1),
            enrichment_grace: Duration::from_secs(3),
            enable_rdns: true,
            enable_geo: true,
            geo_endpoint: DEFAULT_GEO_ENDPOINT.to_string(),
            command_override: None,
        }
    }
}

impl TraceConfig {
    /// Create a new TraceConfig builder
    pub fn builder() -> TraceConfigBuilder {
        TraceConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_hops < 1 {
            return Err("max_hops must be at least 1".to_string());
        }
        if self.probe_timeout.as_millis() == 0 {
            return Err("probe_timeout must be greater than 0".to_string());
        }
        if self.grace_period.as_millis() == 0 {
            return Err("grace_period must be greater than 0".to_string());
        }
        if self.geo_endpoint.is_empty() {
            return Err("geo_endpoint must not be empty".to_string());
        }
        if let Some(cmd) = &self.command_override {
            if cmd.is_empty() {
                return Err("command_override must name a program".to_string());
            }
        }
        Ok(())
    }
}

/// Builder for TraceConfig
#[derive(Debug, Default)]
pub struct TraceConfigBuilder {
    config: TraceConfig,
}

impl TraceConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: TraceConfig::default(),
        }
    }

    /// Set the maximum number of hops
    pub fn max_hops(mut self, hops: u32) -> Self {
        self.config.max_hops = hops;
        self
    }

    /// Set the per-probe wait timeout
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Set the cancellation grace period
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.config.grace_period = grace;
        self
    }

    /// Set the post-completion enrichment drain window
    pub fn enrichment_grace(mut self, grace: Duration) -> Self {
        self.config.enrichment_grace = grace;
        self
    }

    /// Enable or disable reverse DNS lookups
    pub fn enable_rdns(mut self, enable: bool) -> Self {
        self.config.enable_rdns = enable;
        self
    }

    /// Enable or disable geolocation enrichment
    pub fn enable_geo(mut self, enable: bool) -> Self {
        self.config.enable_geo = enable;
        self
    }

    /// Set the geolocation endpoint base URL
    pub fn geo_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.geo_endpoint = endpoint.into();
        self
    }

    /// Override the trace command (program plus arguments)
    pub fn command_override(mut self, command: Vec<String>) -> Self {
        self.config.command_override = Some(command);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TraceConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TraceConfig::default();
        assert_eq!(config.max_hops, 20);
        assert_eq!(config.probe_timeout.as_millis(), 1000);
        assert_eq!(config.grace_period.as_secs(), 1);
        assert!(config.enable_rdns);
        assert!(config.enable_geo);
        assert_eq!(config.geo_endpoint, DEFAULT_GEO_ENDPOINT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = TraceConfig::builder()
            .max_hops(10)
            .probe_timeout(Duration::from_millis(500))
            .enable_geo(false)
            .build()
            .unwrap();

        assert_eq!(config.max_hops, 10);
        assert_eq!(config.probe_timeout.as_millis(), 500);
        assert!(!config.enable_geo);
    }

    #[test]
    fn test_config_validation() {
        let result = TraceConfig::builder().max_hops(0).build();
        assert!(result.is_err());

        let result = TraceConfig::builder()
            .probe_timeout(Duration::from_millis(0))
            .build();
        assert!(result.is_err());

        let result = TraceConfig::builder().geo_endpoint("").build();
        assert!(result.is_err());

        let result = TraceConfig::builder().command_override(vec![]).build();
        assert!(result.is_err());
    }
}
