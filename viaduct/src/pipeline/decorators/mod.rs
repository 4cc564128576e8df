// Built-in decorators selectable by name from configuration:
// - "user-agent": stamps a random browser User-Agent on every request
// - "proxy-pool": routes every request through an endpoint from the ranked pool

pub mod pool_router;
pub mod user_agent;

pub use pool_router::PoolRouter;
pub use user_agent::UserAgent;
