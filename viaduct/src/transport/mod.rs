// Base proxy transport
//
// - dialer: endpoint address parsing and the raw SOCKS5 / HTTP CONNECT dials
// - connector: a hyper connector that routes a client through an endpoint
//
// The `Transport` type at the bottom resolves which proxy (if any) applies to
// a request: request-scoped override first, then the globally configured
// address, then direct.

pub mod connector;
pub mod dialer;

pub use connector::{HttpClient, ProxyConnector};
pub use dialer::{Dialer, ProxyAddr, ProxyScheme};

use crate::config::Settings;
use crate::error::Error;
use crate::utils::host_port;
use anyhow::{Context, Result};
use hyper::Uri;
use hyper::client::HttpConnector;
use hyper::{Body, Client};
use hyper_tls::HttpsConnector;
use log::debug;
use std::time::Duration;
use tokio_native_tls::native_tls;

/// Process-wide immutable view of the proxy configuration, established once
/// at startup.
#[derive(Debug, Clone)]
pub struct Transport {
    global_proxy: Option<ProxyAddr>,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl Transport {
    /// Build from resolved settings. Fails with a configuration error when
    /// the global proxy address is set but unparsable.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let global_proxy = if settings.proxy.addr.is_empty() {
            None
        } else {
            let addr = ProxyAddr::parse(&settings.proxy.addr).map_err(|e| {
                Error::Configuration(format!(
                    "invalid global proxy address '{}': {}",
                    settings.proxy.addr, e
                ))
            })?;
            Some(addr)
        };
        Ok(Self {
            global_proxy,
            timeout: settings.request_timeout(),
            accept_invalid_certs: settings.proxy.ignore_tls,
        })
    }

    pub fn new(global_proxy: Option<ProxyAddr>, timeout: Duration, accept_invalid_certs: bool) -> Self {
        Self { global_proxy, timeout, accept_invalid_certs }
    }

    pub fn is_proxy(&self) -> bool {
        self.global_proxy.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the effective proxy for one request: a non-empty override wins
    /// over the global address; neither means no proxy.
    fn resolve(&self, override_addr: Option<&str>) -> Result<Option<ProxyAddr>> {
        match override_addr.filter(|addr| !addr.is_empty()) {
            Some(addr) => Ok(Some(ProxyAddr::parse(addr)?)),
            None => Ok(self.global_proxy.clone()),
        }
    }

    /// Build the HTTP client serving one request, routed through the resolved
    /// proxy or connecting directly when there is none.
    pub fn client(&self, override_addr: Option<&str>) -> Result<HttpClient> {
        match self.resolve(override_addr)? {
            Some(addr) => {
                debug!("Routing via proxy {}", addr);
                let connector = ProxyConnector::new(addr, self.timeout, self.accept_invalid_certs);
                Ok(HttpClient::Proxied(Client::builder().build::<_, Body>(connector)))
            }
            None => Ok(HttpClient::Direct(Client::builder().build::<_, Body>(self.direct_connector()?))),
        }
    }

    /// A dialer for the resolved proxy. Fails with `NoProxyConfigured` when a
    /// proxy is explicitly required but neither the override nor the global
    /// address provides one.
    pub fn dialer(&self, override_addr: Option<&str>) -> Result<Dialer> {
        let addr = self.resolve(override_addr)?.ok_or(Error::NoProxyConfigured)?;
        Ok(Dialer::new(addr, self.timeout))
    }

    /// TCP reachability check of the verification URL through the global
    /// proxy, run once at startup when a proxy is configured.
    pub async fn verify_connection(&self, verify_url: &str) -> Result<()> {
        let uri: Uri = verify_url.parse().with_context(|| format!("invalid verification URL: {}", verify_url))?;
        let (host, port) = host_port(&uri)?;
        let dialer = self.dialer(None)?;
        dialer.connect(&host, port).await.with_context(|| format!("proxy connection verification failed for {}", verify_url))?;
        Ok(())
    }

    fn direct_connector(&self) -> Result<HttpsConnector<HttpConnector>> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;
        Ok(HttpsConnector::from((http, tls.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(global: Option<&str>) -> Transport {
        let global = global.map(|addr| ProxyAddr::parse(addr).unwrap());
        Transport::new(global, Duration::from_secs(5), false)
    }

    #[test]
    fn test_resolve_override_wins_over_global() {
        let transport = transport(Some("socks5://10.0.0.1:1080"));
        let resolved = transport.resolve(Some("http://10.0.0.2:8080")).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "http://10.0.0.2:8080");
    }

    #[test]
    fn test_resolve_empty_override_falls_back_to_global() {
        let transport = transport(Some("socks5://10.0.0.1:1080"));
        let resolved = transport.resolve(Some("")).unwrap().unwrap();
        assert_eq!(resolved.to_string(), "socks5://10.0.0.1:1080");
    }

    #[test]
    fn test_resolve_none_when_nothing_configured() {
        let transport = transport(None);
        assert!(transport.resolve(None).unwrap().is_none());
    }

    #[test]
    fn test_dialer_requires_a_proxy() {
        let transport = transport(None);
        let err = transport.dialer(None).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoProxyConfigured)));
    }

    #[test]
    fn test_from_settings_bad_global_addr_is_a_configuration_error() {
        let mut settings = Settings::default();
        settings.proxy.addr = "not a proxy".to_string();
        let err = Transport::from_settings(&settings).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Configuration(msg)) => assert!(msg.contains("not a proxy")),
            other => panic!("expected Configuration, got {:?}", other),
        }
    }
}
