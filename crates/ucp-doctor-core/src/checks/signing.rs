//! Signing key structure and the order capability's key requirement.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::jws::SignatureAlgorithm;
use crate::model::{DiagnosticCode, SigningKey};
use crate::registry::ORDER_CAPABILITY;

fn missing(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, str::is_empty)
}

/// Structural problems with one key, in declaration order.
fn key_issues(key: &SigningKey) -> Vec<Value> {
    let issue = |kid: &str, text: &str| json!({ "kid": kid, "issue": text });

    if key.kid.is_empty() {
        return vec![issue("unknown", "Missing kid (key ID)")];
    }
    if key.kty.is_empty() {
        return vec![issue(&key.kid, "Missing kty (key type)")];
    }

    let required = match key.kty.as_str() {
        "EC" => vec![
            (&key.crv, "EC key missing crv (curve)"),
            (&key.x, "EC key missing x coordinate"),
            (&key.y, "EC key missing y coordinate"),
        ],
        "RSA" => vec![
            (&key.n, "RSA key missing n (modulus)"),
            (&key.e, "RSA key missing e (exponent)"),
        ],
        _ => Vec::new(),
    };
    required
        .into_iter()
        .filter(|(field, _)| missing(field))
        .map(|(_, text)| issue(&key.kid, text))
        .collect()
}

fn is_recommended_alg(alg: &str) -> bool {
    alg.parse::<SignatureAlgorithm>()
        .is_ok_and(|a| a.is_recommended())
}

fn key_summary(key: &SigningKey) -> Value {
    json!({ "kid": key.kid, "kty": key.kty, "alg": key.alg, "use": key.key_use })
}

pub struct SigningKeysCheck;

#[async_trait]
impl Check for SigningKeysCheck {
    fn id(&self) -> CheckId {
        CheckId::SIGNING_KEYS
    }

    fn name(&self) -> &'static str {
        "Signing Keys"
    }

    fn description(&self) -> &'static str {
        "Validates JWK signing key format"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(keys) = ctx.profile.as_ref().and_then(|p| p.signing_keys.as_ref()) else {
            return Ok(CheckOutcome::skip("No signing keys defined (optional)"));
        };
        if keys.is_empty() {
            return Ok(CheckOutcome::skip("Signing keys array is empty"));
        }

        let issues: Vec<Value> = keys.iter().flat_map(key_issues).collect();
        if !issues.is_empty() {
            return Ok(CheckOutcome::fail(format!(
                "{} issue(s) found in signing keys",
                issues.len()
            ))
            .with_code(DiagnosticCode::SigningKeyInvalidJwk)
            .with_details(json!({ "issues": issues })));
        }

        let unsupported: Vec<_> = keys
            .iter()
            .filter_map(|k| {
                let alg = k.alg.as_deref()?;
                (!is_recommended_alg(alg)).then(|| json!({ "kid": k.kid, "alg": alg }))
            })
            .collect();
        let summary: Vec<Value> = keys.iter().map(key_summary).collect();

        if !unsupported.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{} signing key(s) use non-recommended algorithms",
                unsupported.len()
            ))
            .with_code(DiagnosticCode::SigningKeyUnsupportedAlg)
            .with_details(json!({
                "keys": summary,
                "unsupportedAlgs": unsupported,
                "note": "UCP recommends ES256, ES384, or ES512 for AP2 and webhook signatures",
            })));
        }

        Ok(
            CheckOutcome::pass(format!("All {} signing key(s) are valid", keys.len()))
                .with_details(json!({ "keys": summary })),
        )
    }
}

/// EC key whose declared algorithm, if any, is one of the ES family.
fn supports_webhook_signing(key: &SigningKey) -> bool {
    key.kty == "EC"
        && key.alg.as_deref().map_or(true, |alg| {
            alg.parse::<SignatureAlgorithm>()
                .is_ok_and(|a| a.is_ap2_allowed())
        })
}

pub struct OrderCapabilityCheck;

#[async_trait]
impl Check for OrderCapabilityCheck {
    fn id(&self) -> CheckId {
        CheckId::ORDER_CAPABILITY
    }

    fn name(&self) -> &'static str {
        "Order Capability"
    }

    fn description(&self) -> &'static str {
        "Validates Order capability signing keys requirement"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::CAPABILITY_NAMES, CheckId::SIGNING_KEYS]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(capabilities) = ctx.capabilities().filter(|c| !c.is_empty()) else {
            return Ok(CheckOutcome::skip("No capabilities defined"));
        };
        let Some(order) = capabilities.iter().find(|c| c.name == ORDER_CAPABILITY) else {
            return Ok(CheckOutcome::skip("Order capability not present"));
        };
        let keys = ctx
            .profile
            .as_ref()
            .map(|p| p.signing_keys())
            .unwrap_or_default();

        if keys.is_empty() {
            return Ok(
                CheckOutcome::fail_with(DiagnosticCode::UcpOrderMissingSigningKeys).with_details(
                    json!({
                        "capability": order.name,
                        "version": order.version,
                        "fix": "Add signing_keys array to your UCP profile with at least one ES256/ES384/ES512 key",
                    }),
                ),
            );
        }

        let supported: Vec<Value> = keys
            .iter()
            .filter(|k| supports_webhook_signing(k))
            .map(|k| json!({ "kid": k.kid, "kty": k.kty, "alg": k.alg }))
            .collect();

        if supported.is_empty() {
            let available: Vec<Value> = keys
                .iter()
                .map(|k| json!({ "kid": k.kid, "kty": k.kty, "alg": k.alg }))
                .collect();
            return Ok(
                CheckOutcome::fail_with(DiagnosticCode::OrderNoSupportedKeys).with_details(json!({
                    "capability": order.name,
                    "note": "Order webhooks require EC keys with ES256, ES384, or ES512 algorithms",
                    "availableKeys": available,
                })),
            );
        }

        Ok(CheckOutcome::pass(format!(
            "Order capability has {} signing key(s) for webhook signatures",
            supported.len()
        ))
        .with_details(json!({
            "capability": order.name,
            "version": order.version,
            "supportedKeys": supported,
        })))
    }
}
