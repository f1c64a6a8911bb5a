//! Service definitions and REST endpoint reachability.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use super::is_reverse_domain_name;
use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::model::Service;
use crate::probe::head_batched;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceIssue {
    pub service: String,
    pub issue: &'static str,
}

/// Required-field problems and recommended-field gaps for one service.
fn inspect_service(name: &str, service: &Service) -> (Vec<ServiceIssue>, Vec<ServiceIssue>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut error = |issue| {
        errors.push(ServiceIssue {
            service: name.to_string(),
            issue,
        })
    };

    if service.version.is_empty() {
        error("Missing version (required)");
    }
    if service.spec.as_deref().map_or(true, str::is_empty) {
        error("Missing spec URL (required in strict mode)");
    }
    if !service.has_transport() {
        error("No transport binding defined (rest, mcp, a2a, or embedded required)");
    }
    if service.rest.as_ref().is_some_and(|b| b.endpoint.is_empty()) {
        error("REST binding missing endpoint");
    }
    if service.mcp.as_ref().is_some_and(|b| b.endpoint.is_empty()) {
        error("MCP binding missing endpoint");
    }
    if service.a2a.as_ref().is_some_and(|b| b.endpoint.is_empty()) {
        error("A2A binding missing endpoint");
    }
    if service.embedded.as_ref().is_some_and(|b| b.schema.is_empty()) {
        error("Embedded binding missing schema URL (required)");
    }

    let mut warn = |issue| {
        warnings.push(ServiceIssue {
            service: name.to_string(),
            issue,
        })
    };
    if service.rest.as_ref().is_some_and(|b| b.schema.is_none()) {
        warn("REST binding missing schema URL (recommended)");
    }
    if service.mcp.as_ref().is_some_and(|b| b.schema.is_none()) {
        warn("MCP binding missing schema URL (recommended)");
    }

    (errors, warnings)
}

pub struct ServiceDefinitionsCheck;

#[async_trait]
impl Check for ServiceDefinitionsCheck {
    fn id(&self) -> CheckId {
        CheckId::SERVICE_DEFINITIONS
    }

    fn name(&self) -> &'static str {
        "Service Definitions"
    }

    fn description(&self) -> &'static str {
        "Validates service definitions have required fields and bindings"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(services) = ctx.profile.as_ref().and_then(|p| p.ucp.services.as_ref()) else {
            return Ok(CheckOutcome::skip("No services found"));
        };
        if services.is_empty() {
            return Ok(CheckOutcome::warn("No services defined in discovery profile")
                .with_details(json!({ "count": 0 })));
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut invalid_names = Vec::new();
        for (name, service) in services {
            if !is_reverse_domain_name(name) {
                invalid_names.push(json!({ "service": name }));
            }
            let (e, w) = inspect_service(name, service);
            errors.extend(e);
            warnings.extend(w);
        }
        let names: Vec<&String> = services.keys().collect();

        if !errors.is_empty() || !invalid_names.is_empty() {
            let mut summary = Vec::new();
            if !errors.is_empty() {
                summary.push(format!("{} validation errors", errors.len()));
            }
            if !invalid_names.is_empty() {
                summary.push(format!("{} invalid service names", invalid_names.len()));
            }
            return Ok(CheckOutcome::fail(format!(
                "Service validation failed: {}",
                summary.join(", ")
            ))
            .with_details(json!({
                "errors": errors,
                "invalidNames": invalid_names,
                "warnings": warnings,
                "serviceCount": services.len(),
                "note": "Service names must use reverse-domain notation (e.g., dev.ucp.shopping)",
            })));
        }

        if !warnings.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{} service(s) defined with {} warning(s)",
                services.len(),
                warnings.len()
            ))
            .with_details(json!({ "warnings": warnings, "services": names })));
        }

        Ok(CheckOutcome::pass(format!(
            "{} service(s) defined with valid structure",
            services.len()
        ))
        .with_details(json!({ "services": names })))
    }
}

pub struct ServiceEndpointsCheck;

#[async_trait]
impl Check for ServiceEndpointsCheck {
    fn id(&self) -> CheckId {
        CheckId::SERVICE_ENDPOINTS
    }

    fn name(&self) -> &'static str {
        "Service Endpoints"
    }

    fn description(&self) -> &'static str {
        "Checks if REST service endpoints are reachable"
    }

    // Runs even when service-definitions only warns or fails.
    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        if !ctx.options().check_endpoints {
            return Ok(CheckOutcome::skip("Endpoint checking disabled"));
        }
        let Some(services) = ctx.profile.as_ref().and_then(|p| p.ucp.services.as_ref()) else {
            return Ok(CheckOutcome::skip("No services found"));
        };

        let (names, endpoints): (Vec<&str>, Vec<String>) = services
            .iter()
            .filter_map(|(name, service)| {
                let endpoint = service.rest.as_ref()?.endpoint.as_str();
                (!endpoint.is_empty()).then(|| (name.as_str(), endpoint.to_string()))
            })
            .unzip();

        if endpoints.is_empty() {
            return Ok(CheckOutcome::skip("No REST endpoints to check"));
        }

        let results = head_batched(ctx.probe(), &endpoints, ctx.timeout()).await;
        let mut reachable = Vec::new();
        let mut failures = Vec::new();
        for (service, (endpoint, result)) in names.iter().zip(results) {
            match result {
                Ok(response) if response.is_success() => reachable.push(json!({
                    "service": service,
                    "endpoint": endpoint,
                    "status": format!("HTTP {}", response.status),
                })),
                Ok(response) => failures.push(json!({
                    "service": service,
                    "endpoint": endpoint,
                    "error": format!("HTTP {}", response.status),
                })),
                Err(err) => failures.push(json!({
                    "service": service,
                    "endpoint": endpoint,
                    "error": err.to_string(),
                })),
            }
        }

        if !failures.is_empty() {
            return Ok(
                CheckOutcome::fail(format!("{} endpoint(s) unreachable", failures.len()))
                    .with_details(json!({ "failures": failures, "reachable": reachable })),
            );
        }

        Ok(CheckOutcome::pass(format!(
            "All {} REST endpoint(s) are reachable",
            reachable.len()
        ))
        .with_details(json!({ "endpoints": reachable })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::Value;

    use crate::fakes::StaticProbe;
    use crate::model::{CheckStatus, DiagnosticOptions};

    fn ctx_with(probe: StaticProbe, services: Value) -> DiagnosticContext {
        let mut ctx = DiagnosticContext::new(
            "https://shop.example",
            DiagnosticOptions::default().with_timeout_ms(200),
            Arc::new(probe),
        );
        ctx.profile = Some(
            serde_json::from_value(json!({
                "ucp": { "version": "2026-01-11", "services": services }
            }))
            .unwrap(),
        );
        ctx
    }

    fn shopping(endpoint: &str) -> Value {
        json!({
            "dev.ucp.shopping": {
                "version": "2026-01-11",
                "spec": "https://ucp.dev/specification/overview",
                "rest": {
                    "endpoint": endpoint,
                    "schema": "https://ucp.dev/services/shopping/rest.openapi.json"
                }
            }
        })
    }

    #[tokio::test]
    async fn test_definitions_pass_for_complete_service() {
        let mut ctx = ctx_with(StaticProbe::new(), shopping("https://shop.example/ucp"));
        let outcome = ServiceDefinitionsCheck.run(&mut ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert_eq!(outcome.message, "1 service(s) defined with valid structure");
    }

    #[tokio::test]
    async fn test_definitions_fail_on_name_and_missing_transport() {
        let mut ctx = ctx_with(
            StaticProbe::new(),
            json!({ "Shopping": { "version": "2026-01-11" } }),
        );
        let outcome = ServiceDefinitionsCheck.run(&mut ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(
            outcome.message,
            "Service validation failed: 2 validation errors, 1 invalid service names"
        );
    }

    #[tokio::test]
    async fn test_definitions_warn_on_missing_binding_schema() {
        let services = json!({
            "dev.ucp.shopping": {
                "version": "2026-01-11",
                "spec": "https://ucp.dev/specification/overview",
                "mcp": { "endpoint": "https://shop.example/mcp" }
            }
        });
        let mut ctx = ctx_with(StaticProbe::new(), services);
        let outcome = ServiceDefinitionsCheck.run(&mut ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Warn);
        assert_eq!(
            outcome.details.unwrap()["warnings"][0]["issue"],
            "MCP binding missing schema URL (recommended)"
        );
    }

    #[tokio::test]
    async fn test_endpoints_reachable() {
        let probe = StaticProbe::new().with_status("https://shop.example/ucp", 200);
        let mut ctx = ctx_with(probe, shopping("https://shop.example/ucp"));
        let outcome = ServiceEndpointsCheck.run(&mut ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Pass);
        assert_eq!(outcome.message, "All 1 REST endpoint(s) are reachable");
    }

    #[tokio::test]
    async fn test_endpoints_timeout_fails() {
        let probe = StaticProbe::new().with_timeout("https://shop.example/ucp");
        let mut ctx = ctx_with(probe, shopping("https://shop.example/ucp"));
        let outcome = ServiceEndpointsCheck.run(&mut ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Fail);
        assert_eq!(outcome.message, "1 endpoint(s) unreachable");
    }

    #[tokio::test]
    async fn test_endpoints_skip_when_disabled() {
        let mut ctx = DiagnosticContext::new(
            "https://shop.example",
            DiagnosticOptions::default().without_endpoint_probes(),
            Arc::new(StaticProbe::new()),
        );
        let outcome = ServiceEndpointsCheck.run(&mut ctx).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Skip);
        assert_eq!(outcome.message, "Endpoint checking disabled");
    }
}
