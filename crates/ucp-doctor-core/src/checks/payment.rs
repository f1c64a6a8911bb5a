use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::json;

use super::is_reverse_domain_name;
use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::model::PaymentHandler;

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

fn missing_required(handler: &PaymentHandler) -> Vec<&'static str> {
    [
        ("id", blank(Some(&handler.id))),
        ("name", blank(Some(&handler.name))),
        ("version", blank(handler.version.as_deref())),
        ("spec", blank(handler.spec.as_deref())),
    ]
    .into_iter()
    .filter_map(|(field, missing)| missing.then_some(field))
    .collect()
}

fn missing_recommended(handler: &PaymentHandler) -> Vec<&'static str> {
    [
        ("config_schema", blank(handler.config_schema.as_deref())),
        ("instrument_schemas", handler.instrument_schemas.is_none()),
        ("config", handler.config.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, missing)| missing.then_some(field))
    .collect()
}

pub struct PaymentHandlersCheck;

#[async_trait]
impl Check for PaymentHandlersCheck {
    fn id(&self) -> CheckId {
        CheckId::PAYMENT_HANDLERS
    }

    fn name(&self) -> &'static str {
        "Payment Handlers"
    }

    fn description(&self) -> &'static str {
        "Validates payment handler definitions"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(handlers) = ctx
            .profile
            .as_ref()
            .and_then(|p| p.payment.as_ref())
            .and_then(|p| p.handlers.as_ref())
        else {
            return Ok(CheckOutcome::skip("No payment handlers defined (optional)"));
        };
        if handlers.is_empty() {
            return Ok(CheckOutcome::skip("Payment handlers array is empty"));
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut invalid_names = Vec::new();
        let mut duplicate_ids = Vec::new();
        let mut seen = HashSet::new();

        for handler in handlers {
            if !handler.id.is_empty() && !seen.insert(handler.id.as_str()) {
                duplicate_ids.push(handler.id.as_str());
            }
            let label = [handler.id.as_str(), handler.name.as_str()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or("unknown");

            if !handler.name.is_empty() && !is_reverse_domain_name(&handler.name) {
                invalid_names.push(json!({ "handler": label, "name": handler.name }));
            }
            let required = missing_required(handler);
            if !required.is_empty() {
                errors.push(json!({ "handler": label, "missing": required }));
            }
            let recommended = missing_recommended(handler);
            if !recommended.is_empty() {
                warnings.push(json!({ "handler": label, "missing": recommended }));
            }
        }

        if !errors.is_empty() || !duplicate_ids.is_empty() || !invalid_names.is_empty() {
            let mut summary = Vec::new();
            if !errors.is_empty() {
                summary.push(format!("{} missing required fields", errors.len()));
            }
            if !duplicate_ids.is_empty() {
                summary.push(format!("{} duplicate handler IDs", duplicate_ids.len()));
            }
            if !invalid_names.is_empty() {
                summary.push(format!("{} invalid name format", invalid_names.len()));
            }
            return Ok(CheckOutcome::fail(format!(
                "Payment handler validation failed: {}",
                summary.join(", ")
            ))
            .with_details(json!({
                "errors": errors,
                "duplicateIds": duplicate_ids,
                "invalidNames": invalid_names,
                "warnings": warnings,
            })));
        }

        let summary: Vec<_> = handlers
            .iter()
            .map(|h| json!({ "id": h.id, "name": h.name, "version": h.version, "type": h.handler_type }))
            .collect();

        if !warnings.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{} payment handler(s) defined, {} missing recommended fields",
                handlers.len(),
                warnings.len()
            ))
            .with_details(json!({
                "handlers": summary,
                "warnings": warnings,
                "note": "Consider adding config_schema, instrument_schemas, and config for complete handler definitions",
            })));
        }

        Ok(
            CheckOutcome::pass(format!("All {} payment handler(s) are valid", handlers.len()))
                .with_details(json!({ "handlers": summary })),
        )
    }
}
