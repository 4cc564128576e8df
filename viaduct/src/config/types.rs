use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved configuration consumed by the transport, the pool, and the
/// decorator registry. Loading and merging is a collaborator concern; the
/// core only reads the values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip)]
    pub(crate) path: PathBuf,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub pool: PoolSettings,

    // Decorators to load, in load order. A single name or a list of names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<OneOrMany>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    // Global proxy address, e.g. "socks5://127.0.0.1:1080". Empty means
    // direct connections unless a request-scoped override is set.
    #[serde(default)]
    pub addr: String,

    // Per-request client timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,

    // URL probed to decide whether an endpoint is usable.
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    // Skip TLS certificate verification on outgoing requests.
    #[serde(default)]
    pub ignore_tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    // Where the candidate endpoints come from: a file path, a URL, or a list
    // of either. Absent means the built-in default remote source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set: Option<OneOrMany>,

    // How many ranked endpoints to retain after a probing pass.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    // Timeout applied to requests routed through the pool.
    #[serde(default = "default_pool_timeout_secs")]
    pub timeout_secs: u64,

    // Per-probe timeout.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    // Bulkhead: maximum concurrent in-flight probes.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    // Where the JSON probe report is written (truncated every pass).
    #[serde(default = "default_report_path")]
    pub report_path: String,

    // Rebuild the pool every N seconds; 0 disables background refresh.
    #[serde(default)]
    pub refresh_secs: u64,
}

/// A descriptor field that accepts either one string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn entries(&self) -> &[String] {
        match self {
            OneOrMany::One(entry) => std::slice::from_ref(entry),
            OneOrMany::Many(entries) => entries.as_slice(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            addr: String::new(),
            timeout_secs: default_request_timeout_secs(),
            verify_url: default_verify_url(),
            ignore_tls: false,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            data_set: None,
            max_size: default_max_size(),
            timeout_secs: default_pool_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            max_in_flight: default_max_in_flight(),
            report_path: default_report_path(),
            refresh_secs: 0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new("./viaduct.json")
    }
}

impl Settings {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().with_extension("json");
        Self { path, proxy: ProxySettings::default(), pool: PoolSettings::default(), plugins: None }
    }

    pub fn get_path(&self) -> &PathBuf {
        &self.path
    }

    /// Decorator names in configured load order; empty when none configured.
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.as_ref().map(|p| p.entries().to_vec()).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.timeout_secs)
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.pool.probe_timeout_secs)
    }
}

impl Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?;
        writeln!(f, "{}", json)
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_verify_url() -> String {
    "http://httpbin.org/ip".to_string()
}

fn default_max_size() -> usize {
    30
}

fn default_pool_timeout_secs() -> u64 {
    60
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_max_in_flight() -> usize {
    64
}

fn default_report_path() -> String {
    "./proxylist.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.proxy.addr, "");
        assert_eq!(settings.proxy.verify_url, "http://httpbin.org/ip");
        assert_eq!(settings.proxy.timeout_secs, 60);
        assert!(!settings.proxy.ignore_tls);
        assert_eq!(settings.pool.max_size, 30);
        assert_eq!(settings.pool.probe_timeout_secs, 5);
        assert_eq!(settings.pool.max_in_flight, 64);
        assert!(settings.plugin_names().is_empty());
    }

    #[test]
    fn test_data_set_single_string() {
        let settings: Settings =
            serde_json::from_str(r#"{"pool": {"data_set": "./proxies.txt"}}"#).unwrap();
        let data_set = settings.pool.data_set.unwrap();
        assert_eq!(data_set.entries(), ["./proxies.txt"]);
    }

    #[test]
    fn test_data_set_list() {
        let settings: Settings = serde_json::from_str(
            r#"{"pool": {"data_set": ["./proxies.txt", "https://example.com/list.txt"]}}"#,
        )
        .unwrap();
        let data_set = settings.pool.data_set.unwrap();
        assert_eq!(data_set.entries().len(), 2);
        assert_eq!(data_set.entries()[1], "https://example.com/list.txt");
    }

    #[test]
    fn test_plugins_single_and_list() {
        let single: Settings = serde_json::from_str(r#"{"plugins": "proxy-pool"}"#).unwrap();
        assert_eq!(single.plugin_names(), ["proxy-pool"]);

        let many: Settings =
            serde_json::from_str(r#"{"plugins": ["user-agent", "proxy-pool"]}"#).unwrap();
        assert_eq!(many.plugin_names(), ["user-agent", "proxy-pool"]);
    }

    #[test]
    fn test_partial_overrides_keep_other_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"pool": {"max_size": 5}, "proxy": {"ignore_tls": true}}"#)
                .unwrap();
        assert_eq!(settings.pool.max_size, 5);
        assert_eq!(settings.pool.probe_timeout_secs, 5);
        assert!(settings.proxy.ignore_tls);
        assert_eq!(settings.proxy.timeout_secs, 60);
    }
}
