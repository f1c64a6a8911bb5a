//! Known UCP capabilities and extensions.

use serde::Serialize;

pub const CHECKOUT_CAPABILITY: &str = "dev.ucp.shopping.checkout";
pub const IDENTITY_LINKING_CAPABILITY: &str = "dev.ucp.common.identity_linking";
pub const ORDER_CAPABILITY: &str = "dev.ucp.shopping.order";
pub const AP2_MANDATE_CAPABILITY: &str = "dev.ucp.shopping.ap2_mandate";

/// Names under which a document may declare the AP2 mandate extension.
pub const AP2_MANDATE_ALIASES: &[&str] = &[AP2_MANDATE_CAPABILITY, "dev.ucp.shopping.ap2_mandates"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Core,
    Extension,
}

/// Registry entry for a published capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityInfo {
    pub name: &'static str,
    pub kind: CapabilityKind,
    /// Parent capability, extensions only.
    pub extends: Option<&'static str>,
    pub description: &'static str,
    pub spec_url: &'static str,
    pub schema_url: &'static str,
    /// Protocol version that introduced the capability.
    pub since: &'static str,
}

pub const ALL_CAPABILITIES: &[CapabilityInfo] = &[
    CapabilityInfo {
        name: CHECKOUT_CAPABILITY,
        kind: CapabilityKind::Core,
        extends: None,
        description: "Facilitates checkout sessions with cart management and tax calculation",
        spec_url: "https://ucp.dev/docs/specification/checkout",
        schema_url: "https://ucp.dev/schemas/shopping/checkout_resp.json",
        since: "2026-01-11",
    },
    CapabilityInfo {
        name: IDENTITY_LINKING_CAPABILITY,
        kind: CapabilityKind::Core,
        extends: None,
        description: "OAuth 2.0-based authorization for platforms to act on user's behalf",
        spec_url: "https://ucp.dev/docs/specification/identity-linking",
        schema_url: "https://ucp.dev/schemas/common/identity_linking.json",
        since: "2026-01-11",
    },
    CapabilityInfo {
        name: ORDER_CAPABILITY,
        kind: CapabilityKind::Core,
        extends: None,
        description: "Webhook-based updates for order lifecycle events",
        spec_url: "https://ucp.dev/docs/specification/order",
        schema_url: "https://ucp.dev/schemas/shopping/order.json",
        since: "2026-01-11",
    },
    CapabilityInfo {
        name: "dev.ucp.shopping.fulfillment",
        kind: CapabilityKind::Extension,
        extends: Some(CHECKOUT_CAPABILITY),
        description: "Adds fulfillment options, shipping destinations, and delivery methods to checkout",
        spec_url: "https://ucp.dev/docs/specification/fulfillment",
        schema_url: "https://ucp.dev/schemas/shopping/fulfillment_resp.json",
        since: "2026-01-11",
    },
    CapabilityInfo {
        name: "dev.ucp.shopping.discount",
        kind: CapabilityKind::Extension,
        extends: Some(CHECKOUT_CAPABILITY),
        description: "Adds discount code support with multiple codes and applied discounts",
        spec_url: "https://ucp.dev/docs/specification/discount",
        schema_url: "https://ucp.dev/schemas/shopping/discount_resp.json",
        since: "2026-01-11",
    },
    CapabilityInfo {
        name: AP2_MANDATE_CAPABILITY,
        kind: CapabilityKind::Extension,
        extends: Some(CHECKOUT_CAPABILITY),
        description: "Cryptographic proof of authorization for autonomous commerce",
        spec_url: "https://ucp.dev/docs/specification/ap2-mandates",
        schema_url: "https://ucp.dev/schemas/shopping/ap2_mandate.json",
        since: "2026-01-11",
    },
];

/// Namespace authorities with a published origin that differs from the
/// reversed-domain default.
pub const NAMESPACE_ORIGINS: &[(&str, &str)] = &[("dev.ucp", "https://ucp.dev")];

pub fn capability_info(name: &str) -> Option<&'static CapabilityInfo> {
    ALL_CAPABILITIES.iter().find(|c| c.name == name)
}

pub fn is_known_capability(name: &str) -> bool {
    capability_info(name).is_some()
}

pub fn is_core_capability(name: &str) -> bool {
    capability_info(name).is_some_and(|c| c.kind == CapabilityKind::Core)
}

pub fn is_extension(name: &str) -> bool {
    capability_info(name).is_some_and(|c| c.kind == CapabilityKind::Extension)
}

/// Registry parent of a known extension.
pub fn parent_capability(name: &str) -> Option<&'static str> {
    capability_info(name).and_then(|c| c.extends)
}

/// Origin registered for a namespace, if any.
pub fn namespace_origin(namespace: &str) -> Option<&'static str> {
    NAMESPACE_ORIGINS
        .iter()
        .find(|(ns, _)| *ns == namespace)
        .map(|(_, origin)| *origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_lookups() {
        assert!(is_core_capability(CHECKOUT_CAPABILITY));
        assert!(!is_extension(CHECKOUT_CAPABILITY));
        assert!(is_extension("dev.ucp.shopping.discount"));
        assert!(is_known_capability(ORDER_CAPABILITY));
        assert!(!is_known_capability("com.example.loyalty"));
    }

    #[test]
    fn test_every_extension_has_a_core_parent() {
        for info in ALL_CAPABILITIES.iter().filter(|c| c.kind == CapabilityKind::Extension) {
            let parent = info.extends.expect("extension parent");
            assert!(is_core_capability(parent), "{} -> {}", info.name, parent);
            assert_eq!(parent_capability(info.name), Some(parent));
        }
        assert_eq!(parent_capability(ORDER_CAPABILITY), None);
    }

    #[test]
    fn test_registry_urls_live_under_ucp_dev() {
        for info in ALL_CAPABILITIES {
            assert!(info.spec_url.starts_with("https://ucp.dev/"));
            assert!(info.schema_url.starts_with("https://ucp.dev/"));
        }
        assert_eq!(namespace_origin("dev.ucp"), Some("https://ucp.dev"));
        assert_eq!(namespace_origin("com.example"), None);
    }
}
