//! Built-in checks, registered in execution-friendly order.

use std::sync::OnceLock;

use regex::Regex;

use crate::engine::Check;

pub mod ap2;
pub mod capabilities;
pub mod payment;
pub mod services;
pub mod signing;
pub mod transport;
pub mod urls;
pub mod version;

pub use ap2::{Ap2MandateFormatCheck, Ap2SignatureCheck, AP2_EXCLUDED_FIELDS};
pub use capabilities::{
    CapabilityCompletenessCheck, CapabilityExtensionsCheck, CapabilityNamesCheck,
    CapabilityRegistryCheck, IntersectionCheck, NamespaceBindingCheck,
};
pub use payment::PaymentHandlersCheck;
pub use services::{ServiceDefinitionsCheck, ServiceEndpointsCheck};
pub use signing::{OrderCapabilityCheck, SigningKeysCheck};
pub use transport::{
    ConnectivityCheck, DiscoveryEndpointCheck, JsonFormatCheck, SchemaValidationCheck,
    WELL_KNOWN_PATH,
};
pub use urls::{collect_urls, EndpointFormatCheck, HttpsEnforcementCheck, SchemaUrlsCheck, SourcedUrl};
pub use version::{VersionFormatCheck, VersionRecencyCheck, VersionRegistryCheck};

/// Every built-in check.
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(ConnectivityCheck),
        Box::new(DiscoveryEndpointCheck),
        Box::new(JsonFormatCheck),
        Box::new(SchemaValidationCheck),
        Box::new(VersionFormatCheck),
        Box::new(VersionRecencyCheck),
        Box::new(VersionRegistryCheck),
        Box::new(HttpsEnforcementCheck),
        Box::new(EndpointFormatCheck),
        Box::new(CapabilityNamesCheck),
        Box::new(CapabilityRegistryCheck),
        Box::new(NamespaceBindingCheck),
        Box::new(CapabilityExtensionsCheck),
        Box::new(IntersectionCheck),
        Box::new(CapabilityCompletenessCheck),
        Box::new(ServiceDefinitionsCheck),
        Box::new(ServiceEndpointsCheck),
        Box::new(PaymentHandlersCheck),
        Box::new(SigningKeysCheck),
        Box::new(Ap2MandateFormatCheck),
        Box::new(OrderCapabilityCheck),
        Box::new(Ap2SignatureCheck),
        Box::new(SchemaUrlsCheck),
    ]
}

fn reverse_domain_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(\.[a-z][a-z0-9_]*)+$").ok())
        .as_ref()
}

/// `com.example.thing` style names for capabilities, services and handlers.
pub fn is_reverse_domain_name(name: &str) -> bool {
    reverse_domain_pattern().is_some_and(|re| re.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reverse_domain_names() {
        assert!(is_reverse_domain_name("dev.ucp.shopping.checkout"));
        assert!(is_reverse_domain_name("com.example.loyalty_points"));
        assert!(!is_reverse_domain_name("checkout"));
        assert!(!is_reverse_domain_name("Dev.ucp.shopping"));
        assert!(!is_reverse_domain_name("dev.ucp."));
        assert!(!is_reverse_domain_name("dev.1ucp"));
    }

    #[test]
    fn test_all_checks_have_unique_ids_and_known_dependencies() {
        let checks = all_checks();
        assert_eq!(checks.len(), 23);
        let ids: HashSet<&str> = checks.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids.len(), checks.len());
        for check in &checks {
            for dep in check.dependencies() {
                assert!(ids.contains(dep.as_str()), "{} -> {}", check.id(), dep);
            }
        }
    }
}
