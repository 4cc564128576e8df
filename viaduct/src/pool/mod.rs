// Self-refreshing ranked endpoint pool
//
// - directory: resolves candidate endpoint addresses from files and URLs
// - prober: bounded concurrent health checks against the verification URL
// - ranked: the shared latency-ordered pool requests draw from
// - report: the JSON probe report written after every rebuild

pub mod directory;
pub mod prober;
pub mod ranked;
pub mod report;

pub use directory::{DEFAULT_SOURCE_URL, Directory};
pub use prober::Prober;
pub use ranked::{ProbeResult, ProbeStatus, RankedPool};

use crate::config::Settings;
use crate::error::Error;
use crate::transport::Transport;
use anyhow::Result;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Glues the directory, the prober, and the ranked pool together:
/// one `rebuild` runs a full retrieve/probe/rank/report pass.
pub struct PoolService {
    directory: Directory,
    prober: Prober,
    pool: Arc<RankedPool>,
    data_set: Option<crate::config::OneOrMany>,
    report_path: PathBuf,
    refresh_interval: Option<Duration>,
}

impl PoolService {
    pub fn from_settings(settings: &Settings, transport: &Transport) -> Result<Self> {
        let directory = Directory::new(transport.client(None)?, settings.pool_timeout());
        let prober = Prober::new(
            settings.proxy.verify_url.clone(),
            settings.probe_timeout(),
            settings.pool.max_in_flight,
            settings.proxy.ignore_tls,
        );
        let refresh_interval = match settings.pool.refresh_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(Self {
            directory,
            prober,
            pool: Arc::new(RankedPool::new(settings.pool.max_size)),
            data_set: settings.pool.data_set.clone(),
            report_path: PathBuf::from(&settings.pool.report_path),
            refresh_interval,
        })
    }

    /// Shared handle to the ranked pool, held by the pool-routing decorator.
    pub fn pool(&self) -> Arc<RankedPool> {
        self.pool.clone()
    }

    /// Resolve candidates, probe them all, replace the pool contents, and
    /// rewrite the report file. Returns the number of usable endpoints and
    /// fails with `PoolExhausted` when a pass leaves the pool empty.
    pub async fn rebuild(&self) -> Result<usize> {
        let candidates = self.directory.resolve(self.data_set.as_ref()).await?;
        info!("Probing {} candidate endpoints", candidates.len());

        let results = self.prober.probe_all(candidates).await;
        self.pool.build(results).await;

        let snapshot = self.pool.snapshot().await;
        report::write(&self.report_path, &snapshot).await?;
        info!("Pool rebuilt with {} usable endpoints", snapshot.len());

        if snapshot.is_empty() {
            return Err(Error::PoolExhausted.into());
        }
        Ok(snapshot.len())
    }

    /// Start the background refresh loop if one is configured. Failed passes
    /// are logged and the loop keeps going. A pass that fails before probing
    /// (a resolution error) leaves the previous pool contents in place; a
    /// completed pass always replaces them, so an exhausted pass leaves the
    /// pool empty, failing requests per-request until a later pass finds
    /// usable endpoints again.
    pub fn spawn_refresh(self: Arc<Self>) {
        let Some(interval) = self.refresh_interval else {
            return;
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                ticker.tick().await;
                if let Err(e) = self.rebuild().await {
                    error!("Pool refresh failed: {}", e);
                }
            }
        });
    }
}
