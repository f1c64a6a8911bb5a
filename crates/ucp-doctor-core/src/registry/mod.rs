//! Static reference data: known capabilities, namespace origins, published
//! protocol versions.

pub mod capabilities;
pub mod versions;

pub use capabilities::{
    capability_info, is_core_capability, is_extension, is_known_capability, namespace_origin,
    parent_capability, CapabilityInfo, CapabilityKind, ALL_CAPABILITIES, AP2_MANDATE_ALIASES,
    AP2_MANDATE_CAPABILITY, CHECKOUT_CAPABILITY, IDENTITY_LINKING_CAPABILITY, NAMESPACE_ORIGINS,
    ORDER_CAPABILITY,
};
pub use versions::{
    deprecation_reason, is_deprecated, is_known_version, version_info, VersionInfo, KNOWN_VERSIONS,
    LATEST_VERSION,
};
