//! Minimal Pipeline Example
//!
//! Builds a pipeline from the default settings (no decorators, no proxy) and
//! sends one GET request through it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example fetch_direct
//! ```

use anyhow::Result;
use hyper::{Body, Request};
use log::info;
use std::sync::Arc;
use viaduct::pipeline::BaseExecutor;
use viaduct::{Pipeline, PipelineRequest, Registry, Settings, Transport};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::env_logger::builder()
        .format_timestamp(None)
        .filter_level(log::LevelFilter::Info)
        .init();

    let settings = Settings::try_load("./viaduct.json").await?;
    let transport = Transport::from_settings(&settings)?;

    // An empty registry composes to the base executor alone.
    let pipeline = Pipeline::build(Arc::new(BaseExecutor::new(transport)), &Registry::empty());

    let request = Request::get("http://httpbin.org/ip").body(Body::empty())?;
    let response = pipeline.execute(PipelineRequest::new(request)).await?;
    info!("Status: {}", response.status());

    let body = hyper::body::to_bytes(response.into_body()).await?;
    println!("{}", String::from_utf8_lossy(&body));
    Ok(())
}
