// Transport pipeline
//
// - executor: the request executor trait, the request wrapper carrying the
//   request-scoped proxy override, and the base executor
// - registry: named decorator constructors and the ordered load list
// - decorators: the built-in decorator implementations

pub mod decorators;
pub mod executor;
pub mod registry;

pub use executor::{BaseExecutor, Executor, PipelineRequest, SharedExecutor};
pub use registry::{Decorator, Registry};

use anyhow::Result;
use hyper::{Body, Response};

/// One effective request executor composed from a base executor and an
/// ordered decorator registry.
///
/// Composition is an onion: folding in load order leaves the last-loaded
/// decorator outermost, so it sees the outgoing request first and the
/// incoming response last. Each pipeline owns its composed executor, so
/// concurrent callers share it without any install/restore step.
pub struct Pipeline {
    executor: SharedExecutor,
}

impl Pipeline {
    pub fn build(base: SharedExecutor, registry: &Registry) -> Self {
        let mut current = base;
        for decorator in registry.iter() {
            current = decorator.produce(current);
        }
        Self { executor: current }
    }

    pub async fn execute(&self, req: PipelineRequest) -> Result<Response<Body>> {
        self.executor.execute(req).await
    }
}
