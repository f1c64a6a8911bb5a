//! Error taxonomy for the diagnostic pipeline.
//!
//! Only configuration-time problems surface as [`DoctorError`]. Anything a
//! check discovers about the target is reported through a check result, never
//! through this type.

use thiserror::Error;

/// Errors produced by engine construction and canonicalization.
#[derive(Debug, Error)]
pub enum DoctorError {
    /// A check transitively depends on itself.
    #[error("circular dependency detected between checks: {checks:?}")]
    DependencyCycle { checks: Vec<String> },

    /// Two registered checks share an identifier.
    #[error("check registered more than once: {id}")]
    DuplicateCheck { id: String },

    /// A selected check id names no registered check.
    #[error("unknown check id: {id}")]
    UnknownCheck { id: String },

    /// NaN or an infinity reached the canonicalizer.
    #[error("non-finite numbers are not permitted in canonical JSON")]
    NonFiniteNumber,

    /// The diagnosis target is not an absolute URL.
    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, DoctorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_cycle_error_displays_check_ids() {
        let err = DoctorError::DependencyCycle {
            checks: vec!["x".to_string(), "y".to_string(), "x".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("circular dependency"));
        assert!(msg.contains("\"x\""));
        assert!(msg.contains("\"y\""));
    }

    #[test]
    fn test_unknown_check_error_displays_id() {
        let err = DoctorError::UnknownCheck {
            id: "not-a-check".to_string(),
        };
        assert!(err.to_string().contains("not-a-check"));
    }

    #[test]
    fn test_invalid_target_error() {
        let err = DoctorError::InvalidTarget {
            target: "shop".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("shop"));
        assert!(msg.contains("relative URL"));
    }
}
