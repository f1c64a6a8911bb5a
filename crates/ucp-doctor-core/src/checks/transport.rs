//! Fetch, parse and structurally validate the discovery document.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::probe::ProbeError;
use crate::schema::validate_profile;

/// Path of the discovery document relative to the target origin.
pub const WELL_KNOWN_PATH: &str = "/.well-known/ucp";

pub struct ConnectivityCheck;

#[async_trait]
impl Check for ConnectivityCheck {
    fn id(&self) -> CheckId {
        CheckId::CONNECTIVITY
    }

    fn name(&self) -> &'static str {
        "Connectivity"
    }

    fn description(&self) -> &'static str {
        "Verifies the domain is reachable via HTTP"
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let url = match ctx.target_url() {
            Ok(url) => url,
            Err(err) => {
                return Ok(CheckOutcome::fail(format!("Failed to connect: {err}"))
                    .with_details(json!({ "error": err.to_string() })))
            }
        };
        let base_url = url.origin().ascii_serialization();

        match ctx.probe().head(&base_url, ctx.timeout()).await {
            Ok(response) => {
                ctx.base_url = Some(base_url.clone());
                Ok(CheckOutcome::pass(format!(
                    "Domain is reachable (HTTP {})",
                    response.status
                ))
                .with_details(json!({ "url": base_url, "status": response.status })))
            }
            Err(ProbeError::Timeout { timeout_ms }) => Ok(CheckOutcome::fail(format!(
                "Connection timed out after {timeout_ms}ms"
            ))
            .with_details(json!({ "error": "timeout" }))),
            Err(err) => Ok(CheckOutcome::fail(format!("Failed to connect: {err}"))
                .with_details(json!({ "error": err.to_string() }))),
        }
    }
}

pub struct DiscoveryEndpointCheck;

#[async_trait]
impl Check for DiscoveryEndpointCheck {
    fn id(&self) -> CheckId {
        CheckId::DISCOVERY_ENDPOINT
    }

    fn name(&self) -> &'static str {
        "Discovery Endpoint"
    }

    fn description(&self) -> &'static str {
        "Verifies /.well-known/ucp endpoint exists and returns a response"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::CONNECTIVITY]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(base_url) = ctx.base_url.as_deref() else {
            return Ok(CheckOutcome::skip("No reachable base URL available"));
        };
        let discovery_url = format!("{base_url}{WELL_KNOWN_PATH}");

        let response = match ctx.probe().get(&discovery_url, ctx.timeout()).await {
            Ok(response) => response,
            Err(ProbeError::Timeout { timeout_ms }) => {
                return Ok(CheckOutcome::fail(format!(
                    "Discovery endpoint timed out after {timeout_ms}ms"
                ))
                .with_details(json!({ "url": discovery_url, "error": "timeout" })))
            }
            Err(err) => {
                return Ok(CheckOutcome::fail(format!(
                    "Failed to fetch discovery endpoint: {err}"
                ))
                .with_details(json!({ "url": discovery_url, "error": err.to_string() })))
            }
        };

        if !response.is_success() {
            return Ok(CheckOutcome::fail(format!(
                "Discovery endpoint returned HTTP {}",
                response.status
            ))
            .with_details(json!({ "url": discovery_url, "status": response.status })));
        }

        let details = json!({
            "url": discovery_url,
            "status": response.status,
            "contentLength": response.body.len(),
        });
        let message = format!("Discovery endpoint exists (HTTP {})", response.status);
        ctx.discovery_url = Some(discovery_url);
        ctx.raw_response = Some(response.body);
        Ok(CheckOutcome::pass(message).with_details(details))
    }
}

pub struct JsonFormatCheck;

#[async_trait]
impl Check for JsonFormatCheck {
    fn id(&self) -> CheckId {
        CheckId::JSON_FORMAT
    }

    fn name(&self) -> &'static str {
        "JSON Format"
    }

    fn description(&self) -> &'static str {
        "Verifies the response is valid JSON"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::DISCOVERY_ENDPOINT]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(raw) = ctx.raw_response.as_deref().filter(|r| !r.is_empty()) else {
            return Ok(CheckOutcome::skip("No response data available"));
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => {
                let details = json!({
                    "type": json_type(&parsed),
                    "isArray": parsed.is_array(),
                });
                ctx.parsed_json = Some(parsed);
                Ok(CheckOutcome::pass("Response is valid JSON").with_details(details))
            }
            Err(err) => Ok(CheckOutcome::fail(format!("Invalid JSON: {err}"))
                .with_details(json!({ "error": err.to_string() }))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null | Value::Object(_) | Value::Array(_) => "object",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
    }
}

pub struct SchemaValidationCheck;

#[async_trait]
impl Check for SchemaValidationCheck {
    fn id(&self) -> CheckId {
        CheckId::SCHEMA_VALIDATION
    }

    fn name(&self) -> &'static str {
        "Schema Validation"
    }

    fn description(&self) -> &'static str {
        "Validates the response matches the UCP discovery profile schema"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::JSON_FORMAT]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(parsed) = ctx.parsed_json.as_ref() else {
            return Ok(CheckOutcome::skip("No parsed JSON available"));
        };

        let profile = match validate_profile(parsed) {
            Ok(profile) => profile,
            Err(issues) => {
                return Ok(CheckOutcome::fail(format!(
                    "Schema validation failed with {} error(s)",
                    issues.len()
                ))
                .with_details(json!({ "errors": issues })))
            }
        };

        let details = json!({
            "version": profile.ucp.version,
            "servicesCount": profile.services().count(),
            "capabilitiesCount": profile.all_capabilities().len(),
            "hasPayment": profile.payment.is_some(),
            "hasSigningKeys": profile.signing_keys.is_some(),
        });
        ctx.profile = Some(profile);
        Ok(CheckOutcome::pass("Response matches UCP discovery profile schema").with_details(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fakes::StaticProbe;
    use crate::model::{CheckStatus, DiagnosticOptions};

    fn ctx(probe: StaticProbe) -> DiagnosticContext {
        DiagnosticContext::new(
            "https://shop.example/some/page",
            DiagnosticOptions::default().with_timeout_ms(500),
            Arc::new(probe),
        )
    }

    #[tokio::test]
    async fn test_connectivity_probes_origin_and_stores_base_url() {
        let mut c = ctx(StaticProbe::new().with_status("https://shop.example", 405));
        let outcome = ConnectivityCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert_eq!(outcome.message, "Domain is reachable (HTTP 405)");
        assert_eq!(c.base_url.as_deref(), Some("https://shop.example"));
    }

    #[tokio::test]
    async fn test_connectivity_timeout_message() {
        let mut c = ctx(StaticProbe::new().with_timeout("https://shop.example"));
        let outcome = ConnectivityCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.message, "Connection timed out after 500ms");
        assert!(c.base_url.is_none());
    }

    #[tokio::test]
    async fn test_connectivity_rejects_relative_target() {
        let mut c = DiagnosticContext::new(
            "shop.example",
            DiagnosticOptions::default(),
            Arc::new(StaticProbe::new()),
        );
        let outcome = ConnectivityCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert!(outcome.message.starts_with("Failed to connect"));
    }

    #[tokio::test]
    async fn test_discovery_non_success_status_fails() {
        let mut c = ctx(StaticProbe::new().with_body(
            "https://shop.example/.well-known/ucp",
            404,
            "not found",
        ));
        c.base_url = Some("https://shop.example".into());
        let outcome = DiscoveryEndpointCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.message, "Discovery endpoint returned HTTP 404");
        assert!(c.raw_response.is_none());
    }

    #[tokio::test]
    async fn test_discovery_then_json_then_schema() {
        let doc = json!({ "ucp": { "version": "2026-01-11" } });
        let mut c = ctx(StaticProbe::new().with_json("https://shop.example/.well-known/ucp", &doc));
        c.base_url = Some("https://shop.example".into());

        assert_eq!(DiscoveryEndpointCheck.run(&mut c).await.unwrap().status, CheckStatus::Pass);
        assert_eq!(
            c.discovery_url.as_deref(),
            Some("https://shop.example/.well-known/ucp")
        );
        assert_eq!(JsonFormatCheck.run(&mut c).await.unwrap().status, CheckStatus::Pass);
        assert_eq!(c.parsed_json, Some(doc));
        assert_eq!(SchemaValidationCheck.run(&mut c).await.unwrap().status, CheckStatus::Pass);
        assert_eq!(c.profile.as_ref().map(|p| p.ucp.version.as_str()), Some("2026-01-11"));
    }

    #[tokio::test]
    async fn test_invalid_json_fails() {
        let mut c = ctx(StaticProbe::new());
        c.raw_response = Some("{not json".into());
        let outcome = JsonFormatCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert!(outcome.message.starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_schema_failure_lists_issues() {
        let mut c = ctx(StaticProbe::new());
        c.parsed_json = Some(json!({ "ucp": {} }));
        let outcome = SchemaValidationCheck.run(&mut c).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.message, "Schema validation failed with 1 error(s)");
        let errors = &outcome.details.unwrap()["errors"];
        assert_eq!(errors[0]["path"], "ucp.version");
        assert_eq!(errors[0]["code"], "invalid_type");
        assert!(c.profile.is_none());
    }

    #[tokio::test]
    async fn test_missing_upstream_artifacts_skip() {
        let mut c = ctx(StaticProbe::new());
        assert_eq!(DiscoveryEndpointCheck.run(&mut c).await.unwrap().status, CheckStatus::Skip);
        assert_eq!(JsonFormatCheck.run(&mut c).await.unwrap().status, CheckStatus::Skip);
        assert_eq!(SchemaValidationCheck.run(&mut c).await.unwrap().status, CheckStatus::Skip);
    }
}
