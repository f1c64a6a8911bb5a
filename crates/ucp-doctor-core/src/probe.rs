//! HTTP collaborator used by network-bound checks.
//!
//! Checks never talk to `reqwest` directly: they go through [`HttpProbe`] so
//! a run can be driven by [`crate::fakes::StaticProbe`] in tests. Every call
//! takes the run's timeout and reports expiry as [`ProbeError::Timeout`].

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::Url;
use thiserror::Error;

/// Maximum number of probes in flight at once during fan-out.
pub const PROBE_BATCH_SIZE: usize = 5;

const USER_AGENT: &str = concat!("ucp-doctor/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// Empty for HEAD requests.
    pub body: String,
}

impl ProbeResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ProbeError {
    pub fn timeout(timeout: Duration) -> Self {
        ProbeError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
    }
}

pub type ProbeResult = Result<ProbeResponse, ProbeError>;

/// Minimal HTTP surface the checks need.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn head(&self, url: &str, timeout: Duration) -> ProbeResult;

    /// GET with `Accept: application/json`, returning the body as text.
    async fn get(&self, url: &str, timeout: Duration) -> ProbeResult;
}

/// Production probe backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl Default for ReqwestProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestProbe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn parse(url: &str) -> Result<Url, ProbeError> {
        Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn transport(err: reqwest::Error) -> ProbeError {
    ProbeError::Transport(err.to_string())
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn head(&self, url: &str, timeout: Duration) -> ProbeResult {
        let url = Self::parse(url)?;
        let request = self.client.head(url).send();
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => Ok(ProbeResponse::new(response.status().as_u16(), "")),
            Ok(Err(err)) => Err(transport(err)),
            Err(_) => Err(ProbeError::timeout(timeout)),
        }
    }

    async fn get(&self, url: &str, timeout: Duration) -> ProbeResult {
        let url = Self::parse(url)?;
        let exchange = async {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(transport)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport)?;
            Ok::<_, ProbeError>(ProbeResponse::new(status, body))
        };
        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::timeout(timeout)),
        }
    }
}

/// HEAD every URL, at most [`PROBE_BATCH_SIZE`] at a time. Each batch is
/// awaited as a whole before the next starts. Results keep input order.
pub async fn head_batched(
    probe: &dyn HttpProbe,
    urls: &[String],
    timeout: Duration,
) -> Vec<(String, ProbeResult)> {
    let mut results = Vec::with_capacity(urls.len());
    for batch in urls.chunks(PROBE_BATCH_SIZE) {
        let outcomes = join_all(batch.iter().map(|url| probe.head(url, timeout))).await;
        results.extend(batch.iter().cloned().zip(outcomes));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StaticProbe;

    #[test]
    fn test_response_success_range() {
        assert!(ProbeResponse::new(204, "").is_success());
        assert!(!ProbeResponse::new(301, "").is_success());
        assert!(!ProbeResponse::new(404, "").is_success());
    }

    #[test]
    fn test_timeout_error_message() {
        let err = ProbeError::timeout(Duration::from_millis(1500));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "request timed out after 1500ms");
    }

    #[tokio::test]
    async fn test_reqwest_probe_rejects_invalid_url() {
        let probe = ReqwestProbe::new();
        let err = probe
            .head("not a url", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::InvalidUrl { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_head_batched_bounds_concurrency() {
        let urls: Vec<String> = (0..12).map(|i| format!("https://e.example/{i}")).collect();
        let mut probe = StaticProbe::new().with_delay(Duration::from_millis(50));
        for url in &urls {
            probe = probe.with_status(url, 200);
        }

        let results = head_batched(&probe, &urls, Duration::from_secs(1)).await;
        assert_eq!(results.len(), 12);
        assert_eq!(results[7].0, urls[7]);
        assert!(results.iter().all(|(_, r)| r.as_ref().is_ok_and(|r| r.status == 200)));
        assert_eq!(probe.max_in_flight(), PROBE_BATCH_SIZE);
    }
}
