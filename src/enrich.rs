//! Per-hop geolocation enrichment workers
//!
//! Every enrichable hop gets one single-shot lookup task, keyed by the
//! hop's arrival index so completions can be matched no matter what order
//! they finish in. Tasks live in a per-session [`JoinSet`]: when the
//! session ends the set is dropped and outstanding lookups are aborted,
//! so abandoned workers never accumulate.

use crate::geo::{GeoInfo, GeoProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Terminal outcome of one enrichment lookup.
///
/// A hop with no delivered result yet is pending by absence; once a result
/// is delivered for its index it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    /// The lookup service returned geographic data.
    Success,
    /// The lookup failed (network error or non-success response). Not
    /// retried automatically.
    Failed,
}

/// Result of one enrichment lookup, delivered exactly once per hop index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Outcome of the lookup.
    pub status: EnrichmentStatus,
    /// Geographic data; present only on success.
    pub geo: Option<GeoInfo>,
}

impl EnrichmentResult {
    /// A successful result carrying geographic data.
    pub fn success(geo: GeoInfo) -> Self {
        Self {
            status: EnrichmentStatus::Success,
            geo: Some(geo),
        }
    }

    /// A failed result.
    pub fn failed() -> Self {
        Self {
            status: EnrichmentStatus::Failed,
            geo: None,
        }
    }
}

/// Pool of in-flight enrichment lookups for one session.
pub struct Enricher {
    provider: Arc<dyn GeoProvider>,
    tasks: JoinSet<(usize, EnrichmentResult)>,
}

impl Enricher {
    /// Create an empty pool backed by the given provider.
    pub fn new(provider: Arc<dyn GeoProvider>) -> Self {
        Self {
            provider,
            tasks: JoinSet::new(),
        }
    }

    /// Launch one lookup for the hop at `hop_index`.
    ///
    /// The caller is responsible for filtering out timeout sentinels and
    /// reserved addresses before spawning.
    pub fn spawn(&mut self, hop_index: usize, ip: String) {
        let provider = Arc::clone(&self.provider);
        self.tasks.spawn(async move {
            match provider.lookup(&ip).await {
                Ok(info) => (hop_index, EnrichmentResult::success(info)),
                Err(_) => (hop_index, EnrichmentResult::failed()),
            }
        });
    }

    /// Whether no lookups are in flight.
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next lookup to finish, in completion order.
    ///
    /// Returns `None` once the pool is empty. Aborted tasks are skipped;
    /// their results are simply never delivered.
    pub async fn join_next(&mut self) -> Option<(usize, EnrichmentResult)> {
        loop {
            match self.tasks.join_next().await? {
                Ok(pair) => return Some(pair),
                Err(_) => continue,
            }
        }
    }

    /// Abort all in-flight lookups.
    pub fn abort_all(&mut self) {
        self.tasks.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Provider stub with a per-address artificial delay; addresses
    /// starting with "fail" report a lookup failure.
    struct StubGeo {
        delays: HashMap<String, Duration>,
    }

    impl StubGeo {
        fn new(delays: &[(&str, u64)]) -> Arc<Self> {
            Arc::new(Self {
                delays: delays
                    .iter()
                    .map(|(ip, ms)| (ip.to_string(), Duration::from_millis(*ms)))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl GeoProvider for StubGeo {
        async fn lookup(&self, ip: &str) -> Result<GeoInfo, GeoError> {
            if let Some(delay) = self.delays.get(ip) {
                tokio::time::sleep(*delay).await;
            }
            if ip.starts_with("fail") {
                return Err(GeoError::LookupFailed(ip.to_string()));
            }
            Ok(GeoInfo {
                country_code: "US".to_string(),
                country: "United States".to_string(),
                city: ip.to_string(),
                lat: 0.0,
                lon: 0.0,
            })
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_attribution() {
        // Hop 1's lookup is slow, hop 3's is fast: results arrive out of
        // order but each carries its own hop index.
        let provider = StubGeo::new(&[("9.9.9.9", 80), ("1.1.1.1", 5)]);
        let mut enricher = Enricher::new(provider);
        enricher.spawn(1, "9.9.9.9".to_string());
        enricher.spawn(3, "1.1.1.1".to_string());

        let (first_idx, first) = enricher.join_next().await.unwrap();
        let (second_idx, second) = enricher.join_next().await.unwrap();

        assert_eq!(first_idx, 3);
        assert_eq!(first.geo.as_ref().unwrap().city, "1.1.1.1");
        assert_eq!(second_idx, 1);
        assert_eq!(second.geo.as_ref().unwrap().city, "9.9.9.9");
        assert!(enricher.is_idle());
    }

    #[tokio::test]
    async fn test_failed_lookup_is_single_shot() {
        let provider = StubGeo::new(&[]);
        let mut enricher = Enricher::new(provider);
        enricher.spawn(0, "fail.example".to_string());

        let (idx, result) = enricher.join_next().await.unwrap();
        assert_eq!(idx, 0);
        assert_eq!(result.status, EnrichmentStatus::Failed);
        assert!(result.geo.is_none());
        // No retry was queued.
        assert!(enricher.is_idle());
        assert!(enricher.join_next().await.is_none());
    }

    #[tokio::test]
    async fn test_slow_lookup_does_not_block_others() {
        let provider = StubGeo::new(&[("9.9.9.9", 10_000), ("1.1.1.1", 1)]);
        let mut enricher = Enricher::new(provider);
        enricher.spawn(0, "9.9.9.9".to_string());
        enricher.spawn(1, "1.1.1.1".to_string());

        let (idx, _) = tokio::time::timeout(Duration::from_secs(2), enricher.join_next())
            .await
            .expect("fast lookup should not be blocked")
            .unwrap();
        assert_eq!(idx, 1);

        enricher.abort_all();
        // The aborted slow task yields no result.
        assert!(enricher.join_next().await.is_none());
    }
}
