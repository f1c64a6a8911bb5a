//! Capability graph validation.
//!
//! Pure functions over a document's capability list and the static registry:
//! classification, dangling-parent detection, intersection/pruning
//! simulation, and namespace-to-origin binding.

use std::collections::HashSet;

use reqwest::Url;
use serde::Serialize;

use crate::model::Capability;
use crate::registry::{self, CapabilityKind};

/// Reference capability set used when no counterpart set is configured.
pub const DEFAULT_REFERENCE_CAPABILITIES: &[&str] = &[
    registry::CHECKOUT_CAPABILITY,
    registry::IDENTITY_LINKING_CAPABILITY,
];

/// Capabilities partitioned by registry kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub core: Vec<String>,
    pub extensions: Vec<String>,
    pub unknown: Vec<String>,
}

impl Classification {
    pub fn known_count(&self) -> usize {
        self.core.len() + self.extensions.len()
    }
}

/// Partition capabilities into known-core, known-extension and unknown.
pub fn classify(capabilities: &[Capability]) -> Classification {
    let mut out = Classification::default();
    for capability in capabilities {
        let name = capability.name.clone();
        match registry::capability_info(&capability.name).map(|info| info.kind) {
            Some(CapabilityKind::Core) => out.core.push(name),
            Some(CapabilityKind::Extension) => out.extensions.push(name),
            None => out.unknown.push(name),
        }
    }
    out
}

/// A known extension whose registry parent is not declared in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingParent {
    pub extension: String,
    pub parent: String,
}

pub fn missing_registry_parents(capabilities: &[Capability]) -> Vec<MissingParent> {
    let declared: HashSet<&str> = capabilities.iter().map(|c| c.name.as_str()).collect();
    capabilities
        .iter()
        .filter_map(|c| {
            let parent = registry::parent_capability(&c.name)?;
            (!declared.contains(parent)).then(|| MissingParent {
                extension: c.name.clone(),
                parent: parent.to_string(),
            })
        })
        .collect()
}

/// An extension whose `extends` names a capability absent from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingExtension {
    pub extension: String,
    pub missing_parent: String,
}

pub fn find_dangling_extensions(capabilities: &[Capability]) -> Vec<DanglingExtension> {
    let declared: HashSet<&str> = capabilities.iter().map(|c| c.name.as_str()).collect();
    capabilities
        .iter()
        .filter_map(|c| {
            let parent = c.extends.as_deref()?;
            (!declared.contains(parent)).then(|| DanglingExtension {
                extension: c.name.clone(),
                missing_parent: parent.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrunedCapability {
    pub name: String,
    pub reason: String,
}

/// Result of negotiating a document's capabilities against a reference set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionOutcome {
    /// Surviving capability names, in document order.
    pub intersection: Vec<String>,
    /// Removed extensions, in removal order.
    pub pruned: Vec<PrunedCapability>,
}

/// Intersect by name, then prune extensions whose parent is not in the
/// intersection until nothing more is removed.
///
/// Each pass evaluates every survivor against the intersection as it stood
/// at the start of the pass, so removals cascade one level per pass.
pub fn simulate_intersection<S: AsRef<str>>(
    capabilities: &[Capability],
    reference: &[S],
) -> IntersectionOutcome {
    let reference: HashSet<&str> = reference.iter().map(AsRef::as_ref).collect();

    let mut seen = HashSet::new();
    let mut intersection: Vec<&Capability> = capabilities
        .iter()
        .filter(|&c| reference.contains(c.name.as_str()) && seen.insert(c.name.as_str()))
        .collect();

    let mut pruned = Vec::new();
    loop {
        let present: HashSet<&str> = intersection.iter().map(|&c| c.name.as_str()).collect();
        let (keep, removed): (Vec<&Capability>, Vec<&Capability>) =
            intersection.into_iter().partition(|c| match c.extends.as_deref() {
                Some(parent) => present.contains(parent),
                None => true,
            });
        intersection = keep;
        if removed.is_empty() {
            break;
        }
        pruned.extend(removed.into_iter().map(|c| PrunedCapability {
            name: c.name.clone(),
            reason: format!(
                "Parent capability \"{}\" not in intersection",
                c.extends.as_deref().unwrap_or_default()
            ),
        }));
    }

    IntersectionOutcome {
        intersection: intersection.into_iter().map(|c| c.name.clone()).collect(),
        pruned,
    }
}

/// Namespace authority of a capability name: the first two dot-separated
/// segments when the name has at least three, otherwise the whole name.
pub fn extract_namespace(name: &str) -> String {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() >= 3 {
        parts[..2].join(".")
    } else {
        name.to_string()
    }
}

/// Origin a namespace must serve its spec and schema URLs from.
pub fn expected_origin(namespace: &str) -> String {
    match registry::namespace_origin(namespace) {
        Some(origin) => origin.to_string(),
        None => {
            let host: Vec<&str> = namespace.split('.').rev().collect();
            format!("https://{}", host.join("."))
        }
    }
}

/// Which capability field carries the offending URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlField {
    Spec,
    Schema,
}

impl UrlField {
    fn label(&self) -> &'static str {
        match self {
            UrlField::Spec => "Spec",
            UrlField::Schema => "Schema",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingViolation {
    pub capability: String,
    pub field: UrlField,
    pub url: String,
    pub expected_origin: String,
    pub reason: String,
}

/// Check a capability's `spec`/`schema` URLs against its namespace origin.
pub fn validate_namespace_binding(capability: &Capability) -> Vec<BindingViolation> {
    let namespace = extract_namespace(&capability.name);
    let expected = expected_origin(&namespace);

    [
        (UrlField::Spec, capability.spec.as_deref()),
        (UrlField::Schema, capability.schema.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, url)| {
        let url = url?;
        if is_under_origin(url, &expected) {
            return None;
        }
        Some(BindingViolation {
            capability: capability.name.clone(),
            field,
            url: url.to_string(),
            expected_origin: expected.clone(),
            reason: format!(
                "{} URL origin \"{}\" does not match namespace \"{}\" expected origin \"{}\"",
                field.label(),
                url_origin(url),
                namespace,
                expected
            ),
        })
    })
    .collect()
}

/// Same scheme, host and effective port. `https://ucp.dev.evil.example` and
/// `https://ucp.dev:8443` are both outside `https://ucp.dev`.
fn is_under_origin(url: &str, origin: &str) -> bool {
    match (Url::parse(url), Url::parse(origin)) {
        (Ok(url), Ok(origin)) => url.origin() == origin.origin(),
        _ => false,
    }
}

fn url_origin(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => url.to_string(),
    }
}
