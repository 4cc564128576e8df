use crate::transport::Transport;
use anyhow::Result;
use async_trait::async_trait;
use hyper::{Body, Request, Response};
use std::sync::Arc;
use std::time::Duration;

/// An outgoing request plus its request-scoped state.
///
/// The proxy override travels with the request value itself: it exists for
/// the duration of one call and instructs the base executor to route through
/// a specific endpoint instead of the global address or the pool's pick.
pub struct PipelineRequest {
    pub request: Request<Body>,
    pub proxy_override: Option<String>,
}

impl PipelineRequest {
    pub fn new(request: Request<Body>) -> Self {
        Self { request, proxy_override: None }
    }

    pub fn with_proxy(mut self, addr: impl Into<String>) -> Self {
        self.proxy_override = Some(addr.into());
        self
    }
}

/// Executes one request. Decorators wrap executors; the base executor at the
/// center performs the actual network call.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, req: PipelineRequest) -> Result<Response<Body>>;
}

pub type SharedExecutor = Arc<dyn Executor>;

/// The innermost executor: resolves the effective proxy via the transport and
/// performs the round trip, bounded by the per-request client timeout.
pub struct BaseExecutor {
    transport: Transport,
    timeout: Duration,
}

impl BaseExecutor {
    pub fn new(transport: Transport) -> Self {
        let timeout = transport.timeout();
        Self { transport, timeout }
    }
}

#[async_trait]
impl Executor for BaseExecutor {
    async fn execute(&self, req: PipelineRequest) -> Result<Response<Body>> {
        let client = self.transport.client(req.proxy_override.as_deref())?;
        let response = tokio::time::timeout(self.timeout, client.request(req.request))
            .await
            .map_err(|_| anyhow::anyhow!("request timed out after {:?}", self.timeout))??;
        Ok(response)
    }
}
