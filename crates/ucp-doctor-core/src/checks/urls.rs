//! URL hygiene: transport security, endpoint shape, schema reachability.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::json;

use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::model::DiscoveryProfile;
use crate::probe::head_batched;

/// A URL declared somewhere in the document, tagged with where it came from
/// (`service:<name>:rest.endpoint`, `payment:<id>:spec`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcedUrl {
    pub url: String,
    pub source: String,
}

impl SourcedUrl {
    fn new(url: &str, source: String) -> Self {
        Self {
            url: url.to_string(),
            source,
        }
    }
}

/// Every URL the document declares, services first, then capabilities,
/// then payment handlers.
pub fn collect_urls(profile: &DiscoveryProfile) -> Vec<SourcedUrl> {
    let mut urls = Vec::new();

    for (name, service) in profile.services() {
        let fields = [
            ("spec", service.spec.as_deref()),
            ("rest.endpoint", service.rest.as_ref().map(|b| b.endpoint.as_str())),
            ("rest.schema", service.rest.as_ref().and_then(|b| b.schema.as_deref())),
            ("mcp.endpoint", service.mcp.as_ref().map(|b| b.endpoint.as_str())),
            ("mcp.schema", service.mcp.as_ref().and_then(|b| b.schema.as_deref())),
            ("a2a.endpoint", service.a2a.as_ref().map(|b| b.endpoint.as_str())),
            ("embedded.schema", service.embedded.as_ref().map(|b| b.schema.as_str())),
        ];
        for (field, url) in fields {
            if let Some(url) = url.filter(|u| !u.is_empty()) {
                urls.push(SourcedUrl::new(url, format!("service:{name}:{field}")));
            }
        }
    }

    for capability in profile.all_capabilities() {
        for (field, url) in [("spec", &capability.spec), ("schema", &capability.schema)] {
            if let Some(url) = url.as_deref().filter(|u| !u.is_empty()) {
                urls.push(SourcedUrl::new(
                    url,
                    format!("capability:{}:{field}", capability.name),
                ));
            }
        }
    }

    for handler in profile.payment_handlers() {
        let id = &handler.id;
        if let Some(spec) = handler.spec.as_deref() {
            urls.push(SourcedUrl::new(spec, format!("payment:{id}:spec")));
        }
        if let Some(schema) = handler.config_schema.as_deref() {
            urls.push(SourcedUrl::new(schema, format!("payment:{id}:config_schema")));
        }
        for schema in handler.instrument_schemas.iter().flatten() {
            urls.push(SourcedUrl::new(schema, format!("payment:{id}:instrument_schema")));
        }
    }

    urls
}

fn is_loopback_host(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
}

pub struct HttpsEnforcementCheck;

#[async_trait]
impl Check for HttpsEnforcementCheck {
    fn id(&self) -> CheckId {
        CheckId::HTTPS_ENFORCEMENT
    }

    fn name(&self) -> &'static str {
        "HTTPS Enforcement"
    }

    fn description(&self) -> &'static str {
        "Validates all URLs use HTTPS protocol"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(profile) = ctx.profile.as_ref() else {
            return Ok(CheckOutcome::skip("No profile available"));
        };
        let urls = collect_urls(profile);
        if urls.is_empty() {
            return Ok(CheckOutcome::skip("No URLs to check"));
        }

        let mut insecure = Vec::new();
        let mut loopback = Vec::new();
        for entry in &urls {
            // Unparseable URLs are endpoint-format's concern.
            let Ok(parsed) = Url::parse(&entry.url) else {
                continue;
            };
            if parsed.scheme() != "http" {
                continue;
            }
            if is_loopback_host(&parsed) {
                loopback.push(entry);
            } else {
                insecure.push(entry);
            }
        }

        if !insecure.is_empty() {
            let mut details = json!({
                "httpUrls": insecure,
                "note": "UCP requires HTTPS for all URLs in production",
            });
            if !loopback.is_empty() {
                details["localhostUrls"] = json!(loopback);
            }
            return Ok(CheckOutcome::fail(format!(
                "{} URL(s) use HTTP instead of HTTPS",
                insecure.len()
            ))
            .with_details(details));
        }

        if !loopback.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{} localhost URL(s) detected (OK for development)",
                loopback.len()
            ))
            .with_details(json!({ "localhostUrls": loopback, "totalUrls": urls.len() })));
        }

        Ok(CheckOutcome::pass(format!("All {} URL(s) use HTTPS", urls.len()))
            .with_details(json!({ "count": urls.len() })))
    }
}

pub struct EndpointFormatCheck;

#[async_trait]
impl Check for EndpointFormatCheck {
    fn id(&self) -> CheckId {
        CheckId::ENDPOINT_FORMAT
    }

    fn name(&self) -> &'static str {
        "Endpoint Format"
    }

    fn description(&self) -> &'static str {
        "Validates endpoint URLs have proper format"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(profile) = ctx.profile.as_ref() else {
            return Ok(CheckOutcome::skip("No profile available"));
        };

        let endpoints: Vec<SourcedUrl> = profile
            .services()
            .flat_map(|(name, service)| {
                [
                    ("rest", service.rest.as_ref().map(|b| b.endpoint.as_str())),
                    ("mcp", service.mcp.as_ref().map(|b| b.endpoint.as_str())),
                    ("a2a", service.a2a.as_ref().map(|b| b.endpoint.as_str())),
                ]
                .into_iter()
                .filter_map(move |(binding, url)| {
                    url.map(|u| SourcedUrl::new(u, format!("service:{name}:{binding}")))
                })
            })
            .collect();

        if endpoints.is_empty() {
            return Ok(CheckOutcome::skip("No endpoints to check"));
        }

        let mut trailing_slash = Vec::new();
        let mut invalid = Vec::new();
        for entry in &endpoints {
            match Url::parse(&entry.url) {
                Ok(parsed) => {
                    let path = parsed.path();
                    if path != "/" && path.ends_with('/') {
                        trailing_slash.push(entry);
                    }
                }
                Err(err) => invalid.push(json!({
                    "url": entry.url,
                    "source": entry.source,
                    "error": err.to_string(),
                })),
            }
        }

        if !invalid.is_empty() {
            let mut details = json!({ "invalidUrls": invalid });
            if !trailing_slash.is_empty() {
                details["trailingSlash"] = json!(trailing_slash);
            }
            return Ok(CheckOutcome::fail(format!(
                "{} endpoint(s) have invalid URL format",
                invalid.len()
            ))
            .with_details(details));
        }

        if !trailing_slash.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{} endpoint(s) have trailing slashes",
                trailing_slash.len()
            ))
            .with_details(json!({
                "trailingSlash": trailing_slash,
                "note": "Endpoints should not have trailing slashes per UCP spec",
            })));
        }

        Ok(
            CheckOutcome::pass(format!("All {} endpoint(s) have valid format", endpoints.len()))
                .with_details(json!({ "count": endpoints.len() })),
        )
    }
}

pub struct SchemaUrlsCheck;

#[async_trait]
impl Check for SchemaUrlsCheck {
    fn id(&self) -> CheckId {
        CheckId::SCHEMA_URLS
    }

    fn name(&self) -> &'static str {
        "Schema URLs"
    }

    fn description(&self) -> &'static str {
        "Checks if referenced schema URLs are reachable"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        if !ctx.options().check_schemas {
            return Ok(CheckOutcome::skip(
                "Schema URL checking disabled (use --check-schemas to enable)",
            ));
        }
        let Some(profile) = ctx.profile.as_ref() else {
            return Ok(CheckOutcome::skip("No profile available"));
        };

        // Endpoints are probed by service-endpoints.
        let mut seen = HashSet::new();
        let urls: Vec<String> = collect_urls(profile)
            .into_iter()
            .filter(|entry| !entry.source.ends_with("endpoint"))
            .map(|entry| entry.url)
            .filter(|url| seen.insert(url.clone()))
            .collect();

        if urls.is_empty() {
            return Ok(CheckOutcome::skip("No schema URLs to check"));
        }

        let mut reachable = 0usize;
        let mut unreachable = Vec::new();
        for (url, result) in head_batched(ctx.probe(), &urls, ctx.timeout()).await {
            match result {
                Ok(response) if response.is_success() => reachable += 1,
                Ok(response) => unreachable
                    .push(json!({ "url": url, "error": format!("HTTP {}", response.status) })),
                Err(err) => unreachable.push(json!({ "url": url, "error": err.to_string() })),
            }
        }

        if !unreachable.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{}/{} schema URL(s) unreachable",
                unreachable.len(),
                urls.len()
            ))
            .with_details(json!({ "unreachable": unreachable, "reachable": reachable })));
        }

        Ok(
            CheckOutcome::pass(format!("All {} schema URL(s) are reachable", urls.len()))
                .with_details(json!({ "count": urls.len() })),
        )
    }
}
