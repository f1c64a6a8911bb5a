//! Capability naming, registry membership, namespace binding and the
//! extension graph.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::json;

use super::is_reverse_domain_name;
use crate::engine::{Check, CheckId, CheckOutcome, DiagnosticContext};
use crate::graph::{
    classify, find_dangling_extensions, missing_registry_parents, simulate_intersection,
    validate_namespace_binding, DEFAULT_REFERENCE_CAPABILITIES,
};
use crate::model::Capability;

/// Declared capabilities from the validated document, `None` when the
/// document is missing or declares none.
fn declared(ctx: &DiagnosticContext) -> Option<Vec<Capability>> {
    ctx.capabilities().filter(|caps| !caps.is_empty())
}

pub struct CapabilityNamesCheck;

#[async_trait]
impl Check for CapabilityNamesCheck {
    fn id(&self) -> CheckId {
        CheckId::CAPABILITY_NAMES
    }

    fn name(&self) -> &'static str {
        "Capability Names"
    }

    fn description(&self) -> &'static str {
        "Validates capability names follow reverse-domain pattern"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(profile) = ctx.profile.as_ref() else {
            return Ok(CheckOutcome::skip("No profile available"));
        };
        let capabilities = profile.all_capabilities();
        if capabilities.is_empty() {
            return Ok(CheckOutcome::skip("No capabilities found"));
        }

        let invalid: Vec<_> = capabilities
            .iter()
            .filter(|c| !is_reverse_domain_name(&c.name))
            .map(|c| {
                json!({
                    "name": c.name,
                    "reason": "Does not match pattern ^[a-z][a-z0-9]*(\\.[a-z][a-z0-9_]*)+$",
                })
            })
            .collect();
        let names: Vec<&str> = capabilities.iter().map(|c| c.name.as_str()).collect();
        let total = capabilities.len();
        let outcome = if invalid.is_empty() {
            CheckOutcome::pass(format!(
                "All {total} capability names follow reverse-domain pattern"
            ))
            .with_details(json!({ "count": total, "names": names }))
        } else {
            CheckOutcome::fail(format!(
                "{} capability name(s) don't follow reverse-domain pattern",
                invalid.len()
            ))
            .with_details(json!({ "invalidNames": invalid, "total": total }))
        };

        ctx.all_capabilities = Some(capabilities);
        Ok(outcome)
    }
}

pub struct CapabilityRegistryCheck;

#[async_trait]
impl Check for CapabilityRegistryCheck {
    fn id(&self) -> CheckId {
        CheckId::CAPABILITY_REGISTRY
    }

    fn name(&self) -> &'static str {
        "Capability Registry Validation"
    }

    fn description(&self) -> &'static str {
        "Validates capabilities against known UCP capability registry"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(capabilities) = declared(ctx) else {
            return Ok(CheckOutcome::skip("No capabilities to validate"));
        };

        let classes = classify(&capabilities);
        let missing = missing_registry_parents(&capabilities);

        if !missing.is_empty() {
            return Ok(CheckOutcome::fail(format!(
                "{} extension(s) have missing parent capabilities",
                missing.len()
            ))
            .with_details(json!({
                "missingParents": missing,
                "knownCount": classes.known_count(),
                "unknownCount": classes.unknown.len(),
            })));
        }

        if !classes.unknown.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "Found {} unknown capability(ies) - may be custom extensions",
                classes.unknown.len()
            ))
            .with_details(json!({
                "unknownCapabilities": classes.unknown,
                "knownCapabilities": classes.known_count(),
                "coreCapabilities": classes.core.len(),
                "extensions": classes.extensions.len(),
            })));
        }

        Ok(
            CheckOutcome::pass("All capabilities are known UCP capabilities").with_details(json!({
                "total": capabilities.len(),
                "core": classes.core.len(),
                "extensions": classes.extensions.len(),
            })),
        )
    }
}

pub struct NamespaceBindingCheck;

#[async_trait]
impl Check for NamespaceBindingCheck {
    fn id(&self) -> CheckId {
        CheckId::NAMESPACE_BINDING
    }

    fn name(&self) -> &'static str {
        "Namespace-to-Origin Binding"
    }

    fn description(&self) -> &'static str {
        "Validates that capability spec/schema URLs match namespace authority origin"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(capabilities) = declared(ctx) else {
            return Ok(CheckOutcome::skip("No capabilities to validate"));
        };

        let violations: Vec<_> = capabilities
            .iter()
            .filter(|c| !c.name.is_empty())
            .flat_map(validate_namespace_binding)
            .collect();

        if !violations.is_empty() {
            let offenders: BTreeSet<&str> =
                violations.iter().map(|v| v.capability.as_str()).collect();
            return Ok(CheckOutcome::fail(format!(
                "{} capability(ies) violate namespace-to-origin binding",
                offenders.len()
            ))
            .with_details(json!({ "violations": violations })));
        }

        Ok(
            CheckOutcome::pass("All capabilities follow namespace-to-origin binding rules")
                .with_details(json!({ "capabilitiesChecked": capabilities.len() })),
        )
    }
}

pub struct CapabilityExtensionsCheck;

#[async_trait]
impl Check for CapabilityExtensionsCheck {
    fn id(&self) -> CheckId {
        CheckId::CAPABILITY_EXTENSIONS
    }

    fn name(&self) -> &'static str {
        "Capability Extensions"
    }

    fn description(&self) -> &'static str {
        "Validates extended capabilities reference existing parents"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::CAPABILITY_NAMES]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(capabilities) = declared(ctx) else {
            return Ok(CheckOutcome::skip("No capabilities found"));
        };

        let dangling = find_dangling_extensions(&capabilities);
        if !dangling.is_empty() {
            return Ok(CheckOutcome::fail(format!(
                "{} extension(s) reference non-existent parent capabilities",
                dangling.len()
            ))
            .with_details(json!({ "invalidExtensions": dangling })));
        }

        let extensions: Vec<_> = capabilities
            .iter()
            .filter_map(|c| {
                c.extends
                    .as_deref()
                    .map(|parent| json!({ "name": c.name, "extends": parent }))
            })
            .collect();

        if extensions.is_empty() {
            return Ok(CheckOutcome::pass("No capability extensions defined")
                .with_details(json!({ "extensionCount": 0 })));
        }

        Ok(CheckOutcome::pass(format!(
            "All {} extension(s) reference valid parent capabilities",
            extensions.len()
        ))
        .with_details(json!({ "extensionCount": extensions.len(), "extensions": extensions })))
    }
}

pub struct IntersectionCheck;

#[async_trait]
impl Check for IntersectionCheck {
    fn id(&self) -> CheckId {
        CheckId::INTERSECTION
    }

    fn name(&self) -> &'static str {
        "Capability Intersection Algorithm"
    }

    fn description(&self) -> &'static str {
        "Simulates capability negotiation with a reference platform profile"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(capabilities) = declared(ctx) else {
            return Ok(CheckOutcome::skip("No capabilities to test intersection"));
        };

        let dangling = find_dangling_extensions(&capabilities);
        if !dangling.is_empty() {
            return Ok(CheckOutcome::fail(format!(
                "{} extension(s) reference non-existent parent capabilities",
                dangling.len()
            ))
            .with_details(json!({
                "orphanedExtensions": dangling,
                "note": "Extensions must have their parent capabilities defined in the same profile",
            })));
        }

        let outcome = match ctx.options().reference_capabilities.as_deref() {
            Some(reference) => simulate_intersection(&capabilities, reference),
            None => simulate_intersection(&capabilities, DEFAULT_REFERENCE_CAPABILITIES),
        };
        let extension_count = capabilities.iter().filter(|c| c.is_extension()).count();

        if !outcome.pruned.is_empty() {
            return Ok(CheckOutcome::pass(format!(
                "Intersection algorithm works correctly ({} extension(s) would be pruned)",
                outcome.pruned.len()
            ))
            .with_details(json!({
                "totalCapabilities": capabilities.len(),
                "afterIntersection": outcome.intersection.len(),
                "intersection": outcome.intersection,
                "pruned": outcome.pruned,
                "note": "Pruned extensions are expected when platform lacks parent capabilities",
            })));
        }

        Ok(
            CheckOutcome::pass("Intersection algorithm validated (all capabilities have parents)")
                .with_details(json!({
                    "totalCapabilities": capabilities.len(),
                    "afterIntersection": outcome.intersection.len(),
                    "extensions": extension_count,
                    "coreCapabilities": capabilities.len() - extension_count,
                })),
        )
    }
}

pub struct CapabilityCompletenessCheck;

#[async_trait]
impl Check for CapabilityCompletenessCheck {
    fn id(&self) -> CheckId {
        CheckId::CAPABILITY_COMPLETENESS
    }

    fn name(&self) -> &'static str {
        "Capability Completeness"
    }

    fn description(&self) -> &'static str {
        "Checks if capabilities have recommended fields (name, version, spec, schema)"
    }

    fn dependencies(&self) -> &[CheckId] {
        &[CheckId::SCHEMA_VALIDATION]
    }

    async fn run(&self, ctx: &mut DiagnosticContext) -> anyhow::Result<CheckOutcome> {
        let Some(capabilities) = declared(ctx) else {
            return Ok(CheckOutcome::skip("No capabilities found"));
        };

        let unnamed = capabilities.iter().filter(|c| c.name.is_empty()).count();
        if unnamed > 0 {
            return Ok(CheckOutcome::fail(format!(
                "{unnamed} capability/capabilities missing required fields"
            ))
            .with_details(json!({
                "missingRequired": [{ "name": "unknown", "missing": ["name"] }],
            })));
        }

        let incomplete: Vec<_> = capabilities
            .iter()
            .filter_map(|c| {
                let missing: Vec<&str> = [
                    ("version", &c.version),
                    ("spec", &c.spec),
                    ("schema", &c.schema),
                ]
                .into_iter()
                .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
                .map(|(field, _)| field)
                .collect();
                (!missing.is_empty()).then(|| json!({ "name": c.name, "missing": missing }))
            })
            .collect();

        if !incomplete.is_empty() {
            return Ok(CheckOutcome::warn(format!(
                "{} capability/capabilities missing recommended fields (spec, schema)",
                incomplete.len()
            ))
            .with_details(json!({
                "missingRecommended": incomplete,
                "note": "Consider adding spec and schema URLs for full UCP compliance",
            })));
        }

        Ok(CheckOutcome::pass(format!(
            "All {} capabilities have required and recommended fields",
            capabilities.len()
        ))
        .with_details(json!({ "count": capabilities.len() })))
    }
}
