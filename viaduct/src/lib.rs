//! viaduct - an extensible outbound HTTP request pipeline.
//!
//! The library composes independently authored request/response decorators
//! around a base proxy-aware transport, and ships a self-refreshing,
//! health-ranked pool of forward proxy endpoints that one of those decorators
//! routes traffic through.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod transport;
pub mod utils;

pub use config::Settings;
pub use error::Error;
pub use pipeline::{Decorator, Executor, Pipeline, PipelineRequest, Registry};
pub use pool::{PoolService, ProbeResult, ProbeStatus, RankedPool};
pub use transport::{ProxyAddr, Transport};
