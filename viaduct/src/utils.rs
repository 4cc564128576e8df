//! Common URL helpers shared across modules

use anyhow::{Result, anyhow};
use hyper::Uri;

/// Default port implied by a URL scheme: 443 for https, 80 otherwise.
pub fn port_for_scheme(scheme: Option<&str>) -> u16 {
    if scheme == Some("https") { 443 } else { 80 }
}

/// Split a URI into its host and effective port, falling back to the
/// scheme's default port when none is present.
pub fn host_port(uri: &Uri) -> Result<(String, u16)> {
    let host = uri.host().ok_or_else(|| anyhow!("URL has no host: {}", uri))?.to_string();
    let port = uri.port_u16().unwrap_or_else(|| port_for_scheme(uri.scheme_str()));
    Ok((host, port))
}

/// Check if a string is an HTTP or HTTPS URL by its scheme prefix.
pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_for_scheme() {
        assert_eq!(port_for_scheme(Some("https")), 443);
        assert_eq!(port_for_scheme(Some("http")), 80);
        assert_eq!(port_for_scheme(None), 80);
    }

    #[test]
    fn test_host_port_explicit_and_default() {
        let uri: Uri = "http://example.com:8080/ip".parse().unwrap();
        assert_eq!(host_port(&uri).unwrap(), ("example.com".to_string(), 8080));

        let uri: Uri = "https://example.com/ip".parse().unwrap();
        assert_eq!(host_port(&uri).unwrap(), ("example.com".to_string(), 443));

        let uri: Uri = "/ip".parse().unwrap();
        assert!(host_port(&uri).is_err());
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("http://example.com/list.txt"));
        assert!(is_http_url("https://example.com/list.txt"));
        assert!(!is_http_url("./proxies.txt"));
        assert!(!is_http_url("socks5://127.0.0.1:1080"));
    }
}
