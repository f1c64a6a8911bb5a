//! The contract every validation unit implements.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::context::DiagnosticContext;
use crate::model::{CheckStatus, DiagnosticCode};

/// Stable identifier of a check, used for dependency declarations and in
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckId(pub &'static str);

impl CheckId {
    pub const CONNECTIVITY: CheckId = CheckId("connectivity");
    pub const DISCOVERY_ENDPOINT: CheckId = CheckId("discovery-endpoint");
    pub const JSON_FORMAT: CheckId = CheckId("json-format");
    pub const SCHEMA_VALIDATION: CheckId = CheckId("schema-validation");
    pub const VERSION_FORMAT: CheckId = CheckId("version-format");
    pub const VERSION_RECENCY: CheckId = CheckId("version-recency");
    pub const VERSION_REGISTRY: CheckId = CheckId("version-registry");
    pub const HTTPS_ENFORCEMENT: CheckId = CheckId("https-enforcement");
    pub const ENDPOINT_FORMAT: CheckId = CheckId("endpoint-format");
    pub const CAPABILITY_NAMES: CheckId = CheckId("capability-names");
    pub const CAPABILITY_REGISTRY: CheckId = CheckId("capability-registry");
    pub const NAMESPACE_BINDING: CheckId = CheckId("namespace-binding");
    pub const CAPABILITY_EXTENSIONS: CheckId = CheckId("capability-extensions");
    pub const INTERSECTION: CheckId = CheckId("intersection");
    pub const CAPABILITY_COMPLETENESS: CheckId = CheckId("capability-completeness");
    pub const SERVICE_DEFINITIONS: CheckId = CheckId("service-definitions");
    pub const SERVICE_ENDPOINTS: CheckId = CheckId("service-endpoints");
    pub const PAYMENT_HANDLERS: CheckId = CheckId("payment-handlers");
    pub const SIGNING_KEYS: CheckId = CheckId("signing-keys");
    pub const AP2_MANDATE_FORMAT: CheckId = CheckId("ap2-mandate-format");
    pub const ORDER_CAPABILITY: CheckId = CheckId("order-capability");
    pub const AP2_SIGNATURE: CheckId = CheckId("ap2-signature");
    pub const SCHEMA_URLS: CheckId = CheckId("schema-urls");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// What a check body reports. The engine adds identity and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub status: CheckStatus,
    pub message: String,
    pub code: Option<DiagnosticCode>,
    pub details: Option<Value>,
}

impl CheckOutcome {
    fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            details: None,
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Fail, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warn, message)
    }

    /// Inapplicable: the feature is absent or upstream found nothing.
    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Skip, message)
    }

    /// Failure carrying a diagnostic code and its canonical message.
    pub fn fail_with(code: DiagnosticCode) -> Self {
        Self::fail(code.message()).with_code(code)
    }

    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A validation unit run by [`crate::DiagnosticEngine`].
///
/// A check reads what upstream checks left in the context and may write
/// artifacts for downstream ones. It must treat an absent artifact as
/// "upstream skipped or found nothing" and report `skip`, never `fail`.
/// Returning `Err` records an unexpected fault; the run continues.
#[async_trait]
pub trait Check: Send + Sync {
    fn id(&self) -> CheckId;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Checks that must have run without failing before this one executes.
    fn dependencies(&self) -> &[CheckId] {
        &[]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_builders() {
        let outcome = CheckOutcome::warn("heads up").with_details(json!({ "n": 1 }));
        assert_eq!(outcome.status, CheckStatus::Warn);
        assert_eq!(outcome.details, Some(json!({ "n": 1 })));
        assert!(outcome.code.is_none());

        let coded = CheckOutcome::fail_with(DiagnosticCode::UcpOrderMissingSigningKeys);
        assert_eq!(coded.status, CheckStatus::Fail);
        assert_eq!(coded.code, Some(DiagnosticCode::UcpOrderMissingSigningKeys));
        assert_eq!(coded.message, DiagnosticCode::UcpOrderMissingSigningKeys.message());
    }

    #[test]
    fn test_check_id_display() {
        assert_eq!(CheckId::AP2_SIGNATURE.to_string(), "ap2-signature");
        assert_eq!(CheckId("custom").as_str(), "custom");
    }
}
