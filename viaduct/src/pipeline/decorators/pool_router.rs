use crate::pipeline::executor::{Executor, PipelineRequest, SharedExecutor};
use crate::pipeline::registry::Decorator;
use crate::pool::RankedPool;
use anyhow::Result;
use async_trait::async_trait;
use hyper::{Body, Response};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Routes each request through an endpoint from the ranked pool.
///
/// A request-scoped override wins over the pool; an empty pool with no
/// override fails only the request that hit it. The delegate call is bounded
/// by the pool timeout, which narrows but never extends the caller's own
/// deadline.
pub struct PoolRouter {
    pool: Arc<RankedPool>,
    timeout: Duration,
}

impl PoolRouter {
    pub fn new(pool: Arc<RankedPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

impl Decorator for PoolRouter {
    fn name(&self) -> &str {
        "proxy-pool"
    }

    fn produce(&self, next: SharedExecutor) -> SharedExecutor {
        Arc::new(PoolRouterExecutor { pool: self.pool.clone(), timeout: self.timeout, next })
    }
}

struct PoolRouterExecutor {
    pool: Arc<RankedPool>,
    timeout: Duration,
    next: SharedExecutor,
}

#[async_trait]
impl Executor for PoolRouterExecutor {
    async fn execute(&self, mut req: PipelineRequest) -> Result<Response<Body>> {
        let endpoint = self.pool.select(req.proxy_override.as_deref()).await?;
        debug!("Routing request through endpoint {}", endpoint);
        req.proxy_override = Some(endpoint);

        tokio::time::timeout(self.timeout, self.next.execute(req))
            .await
            .map_err(|_| anyhow::anyhow!("pooled request timed out after {:?}", self.timeout))?
    }
}
