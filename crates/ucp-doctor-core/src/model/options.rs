//! Run options.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Options bag accepted by [`crate::DiagnosticEngine`].
///
/// Field names follow the camelCase JSON contract so an options object sent
/// by a caller deserializes directly; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticOptions {
    /// Timeout for each network-bound operation, in milliseconds.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,

    /// Probe reachability of declared REST endpoints.
    pub check_endpoints: bool,

    /// Probe reachability of declared spec/schema URLs.
    pub check_schemas: bool,

    /// Keep `details` payloads on results.
    pub verbose: bool,

    /// Explicit subset of check ids to run; empty runs everything.
    pub checks: Vec<String>,

    /// Counterpart capability set for the intersection simulation. `None`
    /// uses [`crate::graph::DEFAULT_REFERENCE_CAPABILITIES`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_capabilities: Option<Vec<String>>,

    /// A signed document carrying `ap2.merchant_authorization`, verified
    /// against the target's signing keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ap2_sample: Option<Value>,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            check_endpoints: true,
            check_schemas: false,
            verbose: false,
            checks: Vec::new(),
            reference_capabilities: None,
            ap2_sample: None,
        }
    }
}

impl DiagnosticOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checks = checks.into_iter().map(Into::into).collect();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn without_endpoint_probes(mut self) -> Self {
        self.check_endpoints = false;
        self
    }
}
