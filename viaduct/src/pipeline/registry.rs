use super::decorators::{PoolRouter, UserAgent};
use super::executor::SharedExecutor;
use crate::config::Settings;
use crate::error::Error;
use crate::pool::RankedPool;
use anyhow::Result;
use log::info;
use std::sync::Arc;

/// A composable wrapper around a request executor. Decorators are stateless
/// with respect to the pipeline; any internal state (like the pool) belongs
/// to the implementation.
pub trait Decorator: Send + Sync {
    fn name(&self) -> &str;

    /// Wrap `next`, returning the executor that callers above this layer see.
    fn produce(&self, next: SharedExecutor) -> SharedExecutor;
}

/// Ordered list of loaded decorators. Decorator units are statically linked
/// and selected by configured name; loading happens once at process start and
/// an unknown name aborts startup.
pub struct Registry {
    loaded: Vec<Arc<dyn Decorator>>,
}

impl Registry {
    pub fn empty() -> Self {
        Self { loaded: Vec::new() }
    }

    /// Instantiate every configured decorator, in configured order.
    pub fn load(settings: &Settings, pool: Arc<RankedPool>) -> Result<Self> {
        let mut registry = Self::empty();
        for name in settings.plugin_names() {
            let decorator = instantiate(&name, settings, &pool).ok_or_else(|| Error::PluginLoad {
                path: name.clone(),
                reason: "no decorator with this name is linked in".to_string(),
            })?;
            info!("Loaded decorator '{}'", decorator.name());
            registry.push(decorator);
        }
        Ok(registry)
    }

    pub fn push(&mut self, decorator: Arc<dyn Decorator>) {
        self.loaded.push(decorator);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Decorator>> {
        self.loaded.iter()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.loaded.iter().map(|d| d.name())).finish()
    }
}

fn instantiate(name: &str, settings: &Settings, pool: &Arc<RankedPool>) -> Option<Arc<dyn Decorator>> {
    match name {
        "user-agent" => Some(Arc::new(UserAgent::new())),
        "proxy-pool" => Some(Arc::new(PoolRouter::new(pool.clone(), settings.pool_timeout()))),
        _ => None,
    }
}
