//! Reverse DNS lookup functionality

use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::sync::Arc;

/// Error type for reverse DNS operations
#[derive(Debug, thiserror::Error)]
pub enum ReverseDnsError {
    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    Resolution(String),

    /// No PTR record found
    #[error("No PTR record found")]
    NotFound,
}

/// Perform a reverse DNS lookup for an IP address, returning the first PTR
/// name without its trailing dot.
pub async fn reverse_dns_lookup(
    ip: IpAddr,
    resolver: &Arc<TokioResolver>,
) -> Result<String, ReverseDnsError> {
    let lookup = resolver
        .reverse_lookup(ip)
        .await
        .map_err(|e| ReverseDnsError::Resolution(e.to_string()))?;

    lookup
        .iter()
        .next()
        .map(|name| name.to_string().trim_end_matches('.').to_string())
        .ok_or(ReverseDnsError::NotFound)
}

/// Create the default DNS resolver used for PTR lookups.
pub fn create_default_resolver() -> TokioResolver {
    TokioResolver::builder_with_config(
        ResolverConfig::cloudflare(),
        TokioConnectionProvider::default(),
    )
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_private_ip_lookup_is_graceful() {
        // Private addresses rarely have public PTR records; the call must
        // fail cleanly rather than panic or hang.
        let resolver = Arc::new(create_default_resolver());
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
        match reverse_dns_lookup(ip, &resolver).await {
            Ok(hostname) => assert!(!hostname.is_empty()),
            Err(e) => assert!(matches!(
                e,
                ReverseDnsError::Resolution(_) | ReverseDnsError::NotFound
            )),
        }
    }
}
