// Configuration module
//
// The resolved values the core consumes (proxy address, timeouts, data-set
// locations, verification URL, decorator names) live here, split into
// focused submodules:
// - types: settings structures and serde defaults
// - loader: reading and saving the JSON file

pub mod loader;
pub mod types;

pub use types::{OneOrMany, PoolSettings, ProxySettings, Settings};
