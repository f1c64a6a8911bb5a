//! Published protocol versions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: &'static str,
    pub spec_url: &'static str,
    /// Set once a version is withdrawn.
    pub deprecation: Option<&'static str>,
}

/// Most recent first.
pub const KNOWN_VERSIONS: &[VersionInfo] = &[VersionInfo {
    version: "2026-01-11",
    spec_url: "https://ucp.dev/docs/specification",
    deprecation: None,
}];

pub const LATEST_VERSION: &str = "2026-01-11";

pub fn version_info(version: &str) -> Option<&'static VersionInfo> {
    KNOWN_VERSIONS.iter().find(|v| v.version == version)
}

pub fn is_known_version(version: &str) -> bool {
    version_info(version).is_some()
}

pub fn is_deprecated(version: &str) -> bool {
    version_info(version).is_some_and(|v| v.deprecation.is_some())
}

pub fn deprecation_reason(version: &str) -> Option<&'static str> {
    version_info(version).and_then(|v| v.deprecation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_is_first_known_version() {
        assert_eq!(KNOWN_VERSIONS[0].version, LATEST_VERSION);
        assert!(is_known_version(LATEST_VERSION));
        assert!(!is_deprecated(LATEST_VERSION));
        assert_eq!(deprecation_reason(LATEST_VERSION), None);
    }

    #[test]
    fn test_unknown_version() {
        assert!(!is_known_version("2025-01-01"));
        assert!(!is_deprecated("2025-01-01"));
    }
}
