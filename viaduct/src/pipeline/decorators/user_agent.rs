use crate::pipeline::executor::{Executor, PipelineRequest, SharedExecutor};
use crate::pipeline::registry::Decorator;
use anyhow::Result;
use async_trait::async_trait;
use hyper::header::{HeaderValue, USER_AGENT};
use hyper::{Body, Response};
use rand::seq::SliceRandom;
use std::sync::Arc;

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:91.0) Gecko/20100101 Firefox/91.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.82 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; WOW64; rv:78.0) Gecko/20100101 Firefox/78.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.71 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15A372 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.72 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.59 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 11; Pixel 4 XL) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 14_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
];

/// Picks a random User-Agent from the built-in list for every request.
pub struct UserAgent;

impl UserAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn random() -> &'static str {
        DEFAULT_USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Decorator for UserAgent {
    fn name(&self) -> &str {
        "user-agent"
    }

    fn produce(&self, next: SharedExecutor) -> SharedExecutor {
        Arc::new(UserAgentExecutor { next })
    }
}

struct UserAgentExecutor {
    next: SharedExecutor,
}

#[async_trait]
impl Executor for UserAgentExecutor {
    async fn execute(&self, mut req: PipelineRequest) -> Result<Response<Body>> {
        req.request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static(UserAgent::random()));
        self.next.execute(req).await
    }
}
