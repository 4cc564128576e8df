use crate::config::OneOrMany;
use crate::error::Error;
use crate::transport::HttpClient;
use crate::utils::is_http_url;
use anyhow::Result;
use log::{debug, info};
use std::path::Path;
use std::time::Duration;

/// Built-in remote source used when no data set is configured.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/proxifly/free-proxy-list/refs/heads/main/proxies/protocols/socks5/data.txt";

/// Resolves a data-set descriptor into a flat, ordered candidate list.
///
/// Each entry is checked against the filesystem first and treated as a URL
/// only when no such file exists. Lists concatenate in descriptor order;
/// duplicates are legal and simply probed twice. Any single entry failing
/// fails the whole resolution.
pub struct Directory {
    client: HttpClient,
    fetch_timeout: Duration,
}

impl Directory {
    /// `client` should come from the global transport so remote data sets are
    /// fetched through the configured proxy, if any. `fetch_timeout` bounds
    /// each remote fetch, request and body read included.
    pub fn new(client: HttpClient, fetch_timeout: Duration) -> Self {
        Self { client, fetch_timeout }
    }

    pub async fn resolve(&self, data_set: Option<&OneOrMany>) -> Result<Vec<String>> {
        match data_set {
            None => self.fetch_remote(DEFAULT_SOURCE_URL).await,
            Some(descriptor) => {
                let mut candidates = Vec::new();
                for entry in descriptor.entries() {
                    candidates.extend(self.resolve_entry(entry).await?);
                }
                Ok(candidates)
            }
        }
    }

    async fn resolve_entry(&self, entry: &str) -> Result<Vec<String>> {
        if Path::new(entry).exists() {
            self.load_local(entry).await
        } else if is_http_url(entry) {
            self.fetch_remote(entry).await
        } else {
            Err(Error::Retrieval {
                entry: entry.to_string(),
                reason: "not an existing file and not an http(s) URL".to_string(),
            }
            .into())
        }
    }

    async fn load_local(&self, path: &str) -> Result<Vec<String>> {
        info!("Loading local endpoint data set from {}", path);
        let content = tokio::fs::read_to_string(path).await.map_err(|e| Error::Retrieval {
            entry: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(parse_lines(&content))
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<String>> {
        info!("Downloading endpoint data set from {}", url);
        let content = tokio::time::timeout(self.fetch_timeout, self.fetch_body(url))
            .await
            .map_err(|_| Error::Retrieval {
                entry: url.to_string(),
                reason: format!("fetch timed out after {:?}", self.fetch_timeout),
            })??;
        let lines = parse_lines(&content);
        debug!("Data set {} yielded {} endpoints", url, lines.len());
        Ok(lines)
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        let request = hyper::Request::get(url).body(hyper::Body::empty()).map_err(|e| {
            Error::Retrieval { entry: url.to_string(), reason: e.to_string() }
        })?;
        let response = self.client.request(request).await.map_err(|e| Error::Retrieval {
            entry: url.to_string(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(Error::Retrieval {
                entry: url.to_string(),
                reason: format!("received HTTP status {}", response.status()),
            }
            .into());
        }
        let body = hyper::body::to_bytes(response.into_body()).await.map_err(|e| {
            Error::Retrieval { entry: url.to_string(), reason: e.to_string() }
        })?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

// Newline-delimited endpoints; blank lines and '#' comments are skipped.
fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
