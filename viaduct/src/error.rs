use thiserror::Error;

/// Failure categories surfaced by the pipeline and the pool.
///
/// Public functions return `anyhow::Result`; these variants ride inside the
/// anyhow chain so callers that care about the category can `downcast_ref`.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed resolved configuration value. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A data-set entry could not be read or fetched. Fatal at startup,
    /// no partial candidate list is built.
    #[error("failed to retrieve data set entry '{entry}': {reason}")]
    Retrieval { entry: String, reason: String },

    /// A configured decorator name did not resolve to a known constructor.
    /// Fatal at startup, names the offending entry.
    #[error("failed to load decorator '{path}': {reason}")]
    PluginLoad { path: String, reason: String },

    /// No Good endpoint survived a probing pass. Fatal for the initial
    /// pool build.
    #[error("no working endpoints after probing")]
    PoolExhausted,

    /// The pool is empty at selection time. Aborts the single request that
    /// hit it, never the process.
    #[error("no endpoint available in the pool")]
    NoEndpointAvailable,

    /// An endpoint string could not be parsed into a proxy address.
    #[error("invalid proxy address: {0}")]
    InvalidProxyAddr(String),

    /// A proxy was explicitly required but neither a request-scoped override
    /// nor a global address is configured.
    #[error("no proxy configured")]
    NoProxyConfigured,
}
