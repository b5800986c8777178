//! Target resolution and the unsupported-target gate

use crate::trace::error::TraceError;
use crate::trace::is_reserved_ip;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::Ipv4Addr;

/// Resolve a user-supplied target to an IPv4 address and verify that
/// tracing it can produce a usable route.
///
/// IPv4 literals are used verbatim; anything else goes through a DNS
/// lookup. Loopback, private, and self targets are rejected with
/// [`TraceError::UnsupportedTarget`] before any subprocess is spawned.
pub async fn resolve_target(target: &str) -> Result<Ipv4Addr, TraceError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(TraceError::Resolution("empty target".to_string()));
    }

    let addr: Ipv4Addr = match target.parse() {
        Ok(ip) => ip,
        Err(_) => lookup_ipv4(target).await?,
    };

    if is_reserved_ip(&addr.to_string()) || Some(addr) == local_ipv4() {
        return Err(TraceError::UnsupportedTarget(target.to_string()));
    }

    Ok(addr)
}

/// Forward DNS lookup, keeping the first IPv4 record.
async fn lookup_ipv4(host: &str) -> Result<Ipv4Addr, TraceError> {
    let resolver = TokioResolver::builder_with_config(
        ResolverConfig::cloudflare(),
        TokioConnectionProvider::default(),
    )
    .build();

    let response = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| TraceError::Resolution(e.to_string()))?;

    response
        .iter()
        .find_map(|ip| match ip {
            std::net::IpAddr::V4(v4) => Some(v4),
            std::net::IpAddr::V6(_) => None,
        })
        .ok_or_else(|| TraceError::Resolution(format!("no IPv4 address found for {host}")))
}

/// Best-effort local IPv4 address, learned from the routing decision of a
/// connected UDP socket. No packets are sent. Returns None when the
/// machine has no default route.
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    match socket.local_addr().ok()? {
        std::net::SocketAddr::V4(addr) => Some(*addr.ip()),
        std::net::SocketAddr::V6(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_private_target_rejected() {
        let err = resolve_target("192.168.1.5").await.unwrap_err();
        assert!(matches!(err, TraceError::UnsupportedTarget(_)));
    }

    #[tokio::test]
    async fn test_loopback_target_rejected() {
        let err = resolve_target("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, TraceError::UnsupportedTarget(_)));
    }

    #[tokio::test]
    async fn test_empty_target_rejected() {
        let err = resolve_target("   ").await.unwrap_err();
        assert!(matches!(err, TraceError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_public_literal_passthrough() {
        // An IP literal never touches DNS.
        let ip = resolve_target("8.8.8.8").await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(8, 8, 8, 8));
    }

    #[test]
    fn test_local_ipv4_does_not_panic() {
        // Environment dependent; only the call path is asserted.
        let _ = local_ipv4();
    }
}
