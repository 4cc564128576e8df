use crate::error::Error;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tokio::sync::RwLock;

/// Classification of one endpoint after a probing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Good,
    Bad,
    Dead,
}

/// Outcome of probing one endpoint. Created exactly once per endpoint per
/// pass and never mutated afterward. Field names in the persisted report
/// match the historical artifact format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(rename = "Proxy")]
    pub proxy: String,
    #[serde(rename = "Status")]
    pub status: ProbeStatus,
    #[serde(rename = "ResponseTime")]
    pub response_time: f64,
    #[serde(rename = "BodyResponse")]
    pub body_response: String,
}

/// The bounded, latency-sorted set of currently usable endpoints.
///
/// Rebuilt wholesale each probing pass. Selection reads a locked snapshot and
/// picks a random index; the stored order is never mutated by readers, so
/// concurrent selects and a concurrent rebuild cannot race on ordering.
pub struct RankedPool {
    max_size: usize,
    entries: RwLock<Vec<ProbeResult>>,
}

impl RankedPool {
    pub fn new(max_size: usize) -> Self {
        Self { max_size, entries: RwLock::new(Vec::new()) }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Replace the pool with the Good subset of `results`, sorted ascending
    /// by latency and truncated to the configured maximum.
    pub async fn build(&self, results: Vec<ProbeResult>) {
        let mut good: Vec<ProbeResult> =
            results.into_iter().filter(|r| r.status == ProbeStatus::Good).collect();
        good.sort_by(|a, b| a.response_time.partial_cmp(&b.response_time).unwrap_or(Ordering::Equal));
        good.truncate(self.max_size);
        *self.entries.write().await = good;
    }

    /// Return one endpoint. A non-empty `requested` override is returned
    /// verbatim without consulting the pool; otherwise pick uniformly at
    /// random. An empty pool is a per-request failure, not a process error.
    pub async fn select(&self, requested: Option<&str>) -> Result<String> {
        if let Some(addr) = requested.filter(|addr| !addr.is_empty()) {
            return Ok(addr.to_string());
        }
        let entries = self.entries.read().await;
        if entries.is_empty() {
            return Err(Error::NoEndpointAvailable.into());
        }
        let index = rand::thread_rng().gen_range(0..entries.len());
        Ok(entries[index].proxy.clone())
    }

    /// The current retained entries, in rank order.
    pub async fn snapshot(&self) -> Vec<ProbeResult> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(proxy: &str, status: ProbeStatus, latency: f64) -> ProbeResult {
        ProbeResult {
            proxy: proxy.to_string(),
            status,
            response_time: latency,
            body_response: String::new(),
        }
    }

    #[tokio::test]
    async fn test_build_keeps_only_good_sorted_by_latency() {
        let pool = RankedPool::new(30);
        pool.build(vec![
            result("p1", ProbeStatus::Good, 0.9),
            result("p2", ProbeStatus::Dead, 0.0),
            result("p3", ProbeStatus::Good, 0.2),
            result("p4", ProbeStatus::Bad, 0.1),
            result("p5", ProbeStatus::Good, 0.5),
        ])
        .await;

        let snapshot = pool.snapshot().await;
        let order: Vec<_> = snapshot.iter().map(|r| r.proxy.as_str()).collect();
        assert_eq!(order, ["p3", "p5", "p1"]);
        assert!(snapshot.iter().all(|r| r.status == ProbeStatus::Good));
    }

    #[tokio::test]
    async fn test_build_truncates_to_max_size() {
        let pool = RankedPool::new(2);
        pool.build(vec![
            result("p1", ProbeStatus::Good, 0.3),
            result("p2", ProbeStatus::Good, 0.1),
            result("p3", ProbeStatus::Good, 0.2),
        ])
        .await;

        let snapshot = pool.snapshot().await;
        let order: Vec<_> = snapshot.iter().map(|r| r.proxy.as_str()).collect();
        assert_eq!(order, ["p2", "p3"]);
    }

    #[tokio::test]
    async fn test_build_replaces_wholesale() {
        let pool = RankedPool::new(30);
        pool.build(vec![result("old", ProbeStatus::Good, 0.1)]).await;
        pool.build(vec![result("new", ProbeStatus::Good, 0.4)]).await;

        let snapshot = pool.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].proxy, "new");
    }

    #[tokio::test]
    async fn test_select_without_override_stays_in_pool() {
        let pool = RankedPool::new(30);
        pool.build(vec![
            result("p1", ProbeStatus::Good, 0.2),
            result("p3", ProbeStatus::Good, 0.5),
        ])
        .await;

        for _ in 0..50 {
            let picked = pool.select(None).await.unwrap();
            assert!(picked == "p1" || picked == "p3", "picked endpoint outside pool: {}", picked);
        }
    }

    #[tokio::test]
    async fn test_select_does_not_reorder_the_pool() {
        let pool = RankedPool::new(30);
        pool.build(vec![
            result("p1", ProbeStatus::Good, 0.1),
            result("p2", ProbeStatus::Good, 0.2),
            result("p3", ProbeStatus::Good, 0.3),
        ])
        .await;

        for _ in 0..20 {
            let _ = pool.select(None).await.unwrap();
        }
        let order: Vec<_> = pool.snapshot().await.iter().map(|r| r.proxy.clone()).collect();
        assert_eq!(order, ["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_select_override_returned_verbatim_even_if_not_in_pool() {
        let pool = RankedPool::new(30);
        pool.build(vec![result("p1", ProbeStatus::Good, 0.2)]).await;

        let picked = pool.select(Some("socks5://outsider:1080")).await.unwrap();
        assert_eq!(picked, "socks5://outsider:1080");
    }

    #[tokio::test]
    async fn test_select_override_works_on_empty_pool() {
        let pool = RankedPool::new(30);
        let picked = pool.select(Some("socks5://outsider:1080")).await.unwrap();
        assert_eq!(picked, "socks5://outsider:1080");
    }

    #[tokio::test]
    async fn test_select_empty_pool_fails_without_side_effects() {
        let pool = RankedPool::new(30);
        let err = pool.select(None).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoEndpointAvailable)));
        assert!(pool.is_empty().await);
    }

    #[test]
    fn test_probe_result_report_field_names() {
        let json = serde_json::to_string(&result("p1", ProbeStatus::Good, 0.25)).unwrap();
        assert!(json.contains("\"Proxy\":\"p1\""));
        assert!(json.contains("\"Status\":\"good\""));
        assert!(json.contains("\"ResponseTime\":0.25"));
        assert!(json.contains("\"BodyResponse\""));
    }
}
