use super::ranked::{ProbeResult, ProbeStatus};
use crate::transport::{ProxyAddr, ProxyConnector};
use hyper::{Body, Client, Request, StatusCode};
use log::{debug, trace};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

/// Probes every candidate endpoint against the verification URL.
///
/// One task per candidate, fan-out bounded by `max_in_flight`, results
/// gathered into a mutex-guarded accumulator, and the caller blocked until
/// every probe has finished. Aggregation order is unspecified.
#[derive(Debug, Clone)]
pub struct Prober {
    verify_url: String,
    probe_timeout: Duration,
    max_in_flight: usize,
    accept_invalid_certs: bool,
}

impl Prober {
    pub fn new(
        verify_url: impl Into<String>,
        probe_timeout: Duration,
        max_in_flight: usize,
        accept_invalid_certs: bool,
    ) -> Self {
        Self {
            verify_url: verify_url.into(),
            probe_timeout,
            max_in_flight: max_in_flight.max(1),
            accept_invalid_certs,
        }
    }

    pub async fn probe_all(&self, candidates: Vec<String>) -> Vec<ProbeResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let results = Arc::new(Mutex::new(Vec::with_capacity(candidates.len())));
        let mut handles = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let semaphore = semaphore.clone();
            let results = results.clone();
            let prober = self.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let result = prober.probe_one(&candidate).await;
                trace!("Probe {} -> {:?} ({:.3}s)", candidate, result.status, result.response_time);
                results.lock().await.push(result);
            }));
        }

        // Fan-in barrier: the pool is only rebuilt from a complete pass.
        for handle in handles {
            let _ = handle.await;
        }

        let mut guard = results.lock().await;
        std::mem::take(&mut *guard)
    }

    /// One HTTP GET to the verification URL through `candidate`. Dead when
    /// the transport cannot be built or the request fails, Bad on a non-200
    /// status or unreadable body, Good otherwise. The probe timeout bounds
    /// the whole round trip including the body read, so a stalling endpoint
    /// cannot hold a probing pass open. Latency is measured from just before
    /// the request to just after the response headers arrive.
    async fn probe_one(&self, candidate: &str) -> ProbeResult {
        let addr = match ProxyAddr::parse(candidate) {
            Ok(addr) => addr,
            Err(e) => return self.dead(candidate, e.to_string()),
        };
        let connector = ProxyConnector::new(addr, self.probe_timeout, self.accept_invalid_certs);
        let client = Client::builder().build::<_, Body>(connector);
        let request = match Request::get(self.verify_url.as_str()).body(Body::empty()) {
            Ok(request) => request,
            Err(e) => return self.dead(candidate, e.to_string()),
        };

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.probe_timeout, async {
            let response = match client.request(request).await {
                Ok(response) => response,
                Err(e) => return self.dead(candidate, e.to_string()),
            };
            let elapsed = start.elapsed().as_secs_f64();

            if response.status() != StatusCode::OK {
                debug!("Endpoint {} answered {}", candidate, response.status());
                return ProbeResult {
                    proxy: candidate.to_string(),
                    status: ProbeStatus::Bad,
                    response_time: elapsed,
                    body_response: String::new(),
                };
            }

            match hyper::body::to_bytes(response.into_body()).await {
                Ok(body) => ProbeResult {
                    proxy: candidate.to_string(),
                    status: ProbeStatus::Good,
                    response_time: elapsed,
                    body_response: String::from_utf8_lossy(&body).trim().to_string(),
                },
                Err(e) => ProbeResult {
                    proxy: candidate.to_string(),
                    status: ProbeStatus::Bad,
                    response_time: elapsed,
                    body_response: e.to_string(),
                },
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => self.dead(candidate, "probe timed out".to_string()),
        }
    }

    fn dead(&self, candidate: &str, reason: String) -> ProbeResult {
        ProbeResult {
            proxy: candidate.to_string(),
            status: ProbeStatus::Dead,
            response_time: 0.0,
            body_response: reason,
        }
    }
}
