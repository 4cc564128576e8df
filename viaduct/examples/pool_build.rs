//! Pool Build Example
//!
//! Retrieves candidate endpoints, probes them concurrently, and prints the
//! resulting latency-ranked pool.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example pool_build
//! ```
//!
//! Configure `pool.data_set` in viaduct.json to point at your own endpoint
//! lists; without it the built-in remote source is used.

use anyhow::Result;
use log::info;
use viaduct::{PoolService, Settings, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::env_logger::builder()
        .format_timestamp(None)
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = Settings::try_load("./viaduct.json").await?;
    let transport = Transport::from_settings(&settings)?;

    let service = PoolService::from_settings(&settings, &transport)?;
    let usable = service.rebuild().await?;
    info!("{} usable endpoints, report written to {}", usable, settings.pool.report_path);

    for entry in service.pool().snapshot().await {
        println!("{} ({:.3}s)", entry.proxy, entry.response_time);
    }
    Ok(())
}
