//! Per-run accumulator shared by every check in a run.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Url;
use serde_json::Value;

use crate::error::DoctorError;
use crate::model::{Capability, DiagnosticOptions, DiscoveryProfile};
use crate::probe::HttpProbe;

/// Typed artifacts produced during one run, plus the run's read-only inputs.
///
/// Each artifact field is written by the check named in its doc comment and
/// is `None` until that check succeeds. The engine owns the context; a check
/// only sees it for the duration of its `run`.
pub struct DiagnosticContext {
    target: String,
    options: DiagnosticOptions,
    probe: Arc<dyn HttpProbe>,

    /// `scheme://host[:port]` of the target (connectivity).
    pub base_url: Option<String>,
    /// Absolute URL of the discovery document (discovery-endpoint).
    pub discovery_url: Option<String>,
    /// Raw discovery response body (discovery-endpoint).
    pub raw_response: Option<String>,
    /// Parsed but unvalidated document (json-format).
    pub parsed_json: Option<Value>,
    /// Structurally valid document (schema-validation).
    pub profile: Option<DiscoveryProfile>,
    /// Calendar date of `ucp.version` (version-format).
    pub version_date: Option<NaiveDate>,
    /// Top-level and inline capabilities (capability-names).
    pub all_capabilities: Option<Vec<Capability>>,
    /// The declared AP2 mandate capability (ap2-mandate-format).
    pub ap2_capability: Option<Capability>,
}

impl DiagnosticContext {
    pub fn new(
        target: impl Into<String>,
        options: DiagnosticOptions,
        probe: Arc<dyn HttpProbe>,
    ) -> Self {
        Self {
            target: target.into(),
            options,
            probe,
            base_url: None,
            discovery_url: None,
            raw_response: None,
            parsed_json: None,
            profile: None,
            version_date: None,
            all_capabilities: None,
            ap2_capability: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn options(&self) -> &DiagnosticOptions {
        &self.options
    }

    pub fn timeout(&self) -> Duration {
        self.options.timeout()
    }

    pub fn probe(&self) -> &dyn HttpProbe {
        self.probe.as_ref()
    }

    /// The target as an absolute http(s) URL.
    pub fn target_url(&self) -> Result<Url, DoctorError> {
        let invalid = |reason: String| DoctorError::InvalidTarget {
            target: self.target.clone(),
            reason,
        };
        let url = Url::parse(&self.target).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            "http" | "https" => Err(invalid("missing host".to_string())),
            other => Err(invalid(format!("unsupported scheme {other}"))),
        }
    }

    /// Capabilities for checks that run after capability-names, falling back
    /// to the validated document when that check was not selected.
    pub fn capabilities(&self) -> Option<Vec<Capability>> {
        self.all_capabilities
            .clone()
            .or_else(|| self.profile.as_ref().map(DiscoveryProfile::all_capabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StaticProbe;
    use serde_json::json;

    fn ctx(target: &str) -> DiagnosticContext {
        DiagnosticContext::new(target, DiagnosticOptions::default(), Arc::new(StaticProbe::new()))
    }

    #[test]
    fn test_target_url_accepts_http_and_https() {
        assert!(ctx("https://shop.example").target_url().is_ok());
        assert!(ctx("http://localhost:8080/store").target_url().is_ok());
    }

    #[test]
    fn test_target_url_rejects_other_inputs() {
        assert!(matches!(
            ctx("shop.example").target_url(),
            Err(DoctorError::InvalidTarget { .. })
        ));
        assert!(ctx("ftp://shop.example").target_url().is_err());
    }

    #[test]
    fn test_capabilities_fall_back_to_profile() {
        let mut c = ctx("https://shop.example");
        assert!(c.capabilities().is_none());
        c.profile = Some(
            serde_json::from_value(json!({
                "ucp": { "version": "2026-01-11", "capabilities": [{ "name": "dev.ucp.shopping.checkout" }] }
            }))
            .unwrap(),
        );
        assert_eq!(c.capabilities().map(|v| v.len()), Some(1));
        c.all_capabilities = Some(vec![]);
        assert_eq!(c.capabilities().map(|v| v.len()), Some(0));
    }
}
