//! In-memory fakes for the HTTP collaborator (testing only).
//!
//! `StaticProbe` serves canned responses per URL, can simulate timeouts,
//! transport failures and latency, and records every request it receives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::probe::{HttpProbe, ProbeError, ProbeResponse, ProbeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    Get,
}

/// A request the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: ProbeMethod,
    pub url: String,
}

#[derive(Debug, Clone)]
enum Canned {
    Respond(ProbeResponse),
    Timeout,
    Transport(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Canned-response probe keyed by exact URL. Unknown URLs fail with a
/// transport error, like a refused connection.
#[derive(Debug, Default)]
pub struct StaticProbe {
    routes: HashMap<String, Canned>,
    delay: Option<Duration>,
    requests: Mutex<Vec<RecordedRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `url` with `status` and an empty body.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.with_body(url, status, "")
    }

    pub fn with_body(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.routes
            .insert(url.into(), Canned::Respond(ProbeResponse::new(status, body)));
        self
    }

    /// Respond to `url` with `200` and `document` serialized as JSON.
    pub fn with_json(self, url: impl Into<String>, document: &Value) -> Self {
        self.with_body(url, 200, document.to_string())
    }

    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Canned::Timeout);
        self
    }

    pub fn with_transport_error(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.routes
            .insert(url.into(), Canned::Transport(message.into()));
        self
    }

    /// Hold every response for `delay`. A delay longer than the caller's
    /// timeout yields [`ProbeError::Timeout`].
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Peak number of concurrently outstanding requests.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn serve(&self, method: ProbeMethod, url: &str, timeout: Duration) -> ProbeResult {
        lock(&self.requests).push(RecordedRequest {
            method,
            url: url.to_string(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let outcome = self.respond(method, url, timeout).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    async fn respond(&self, method: ProbeMethod, url: &str, timeout: Duration) -> ProbeResult {
        if let Some(delay) = self.delay {
            if delay > timeout {
                tokio::time::sleep(timeout).await;
                return Err(ProbeError::timeout(timeout));
            }
            tokio::time::sleep(delay).await;
        }

        match self.routes.get(url) {
            Some(Canned::Respond(response)) => {
                let mut response = response.clone();
                if method == ProbeMethod::Head {
                    response.body.clear();
                }
                Ok(response)
            }
            Some(Canned::Timeout) => Err(ProbeError::timeout(timeout)),
            Some(Canned::Transport(message)) => Err(ProbeError::Transport(message.clone())),
            None => Err(ProbeError::Transport(format!("connection refused: {url}"))),
        }
    }
}

#[async_trait]
impl HttpProbe for StaticProbe {
    async fn head(&self, url: &str, timeout: Duration) -> ProbeResult {
        self.serve(ProbeMethod::Head, url, timeout).await
    }

    async fn get(&self, url: &str, timeout: Duration) -> ProbeResult {
        self.serve(ProbeMethod::Get, url, timeout).await
    }
}
