//! Diagnostic codes attached to check results.
//!
//! These identify validation findings of this tool, not UCP protocol errors.

use serde::{Deserialize, Serialize};

/// Stable machine-readable code for a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Order capability
    UcpOrderMissingSigningKeys,
    OrderNoSupportedKeys,

    // AP2 signature
    Ap2SignatureInvalidFormat,
    Ap2SignatureMissingKid,
    Ap2SignatureKeyNotFound,
    Ap2SignatureVerificationFailed,
    Ap2SignatureUnsupportedAlg,

    // AP2 mandate
    Ap2MandateInvalidFormat,
    Ap2MandateMissing,
    Ap2MandateInvalidSdjwt,

    // Signing keys
    SigningKeyInvalidJwk,
    SigningKeyUnsupportedAlg,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UcpOrderMissingSigningKeys => "UCP_ORDER_MISSING_SIGNING_KEYS",
            DiagnosticCode::OrderNoSupportedKeys => "ORDER_NO_SUPPORTED_KEYS",
            DiagnosticCode::Ap2SignatureInvalidFormat => "AP2_SIGNATURE_INVALID_FORMAT",
            DiagnosticCode::Ap2SignatureMissingKid => "AP2_SIGNATURE_MISSING_KID",
            DiagnosticCode::Ap2SignatureKeyNotFound => "AP2_SIGNATURE_KEY_NOT_FOUND",
            DiagnosticCode::Ap2SignatureVerificationFailed => "AP2_SIGNATURE_VERIFICATION_FAILED",
            DiagnosticCode::Ap2SignatureUnsupportedAlg => "AP2_SIGNATURE_UNSUPPORTED_ALG",
            DiagnosticCode::Ap2MandateInvalidFormat => "AP2_MANDATE_INVALID_FORMAT",
            DiagnosticCode::Ap2MandateMissing => "AP2_MANDATE_MISSING",
            DiagnosticCode::Ap2MandateInvalidSdjwt => "AP2_MANDATE_INVALID_SDJWT",
            DiagnosticCode::SigningKeyInvalidJwk => "SIGNING_KEY_INVALID_JWK",
            DiagnosticCode::SigningKeyUnsupportedAlg => "SIGNING_KEY_UNSUPPORTED_ALG",
        }
    }

    /// Canonical human-readable message for the code.
    pub fn message(&self) -> &'static str {
        match self {
            DiagnosticCode::UcpOrderMissingSigningKeys => {
                "Order capability requires signing_keys for webhook signature verification"
            }
            DiagnosticCode::OrderNoSupportedKeys => {
                "No signing keys support recommended algorithms for Order capability"
            }
            DiagnosticCode::Ap2SignatureInvalidFormat => {
                "AP2 signature must be detached JWS format (header..signature)"
            }
            DiagnosticCode::Ap2SignatureMissingKid => {
                "AP2 signature header missing kid (key ID) claim"
            }
            DiagnosticCode::Ap2SignatureKeyNotFound => {
                "Signing key with specified kid not found in signing_keys array"
            }
            DiagnosticCode::Ap2SignatureVerificationFailed => {
                "AP2 signature verification failed - signature does not match payload"
            }
            DiagnosticCode::Ap2SignatureUnsupportedAlg => {
                "AP2 signature algorithm must be ES256, ES384, or ES512"
            }
            DiagnosticCode::Ap2MandateInvalidFormat => {
                "Checkout mandate must be valid SD-JWT+kb format"
            }
            DiagnosticCode::Ap2MandateMissing => {
                "AP2 capability negotiated but checkout_mandate missing in complete request"
            }
            DiagnosticCode::Ap2MandateInvalidSdjwt => "Checkout mandate SD-JWT structure is invalid",
            DiagnosticCode::SigningKeyInvalidJwk => {
                "Signing key does not conform to JWK specification"
            }
            DiagnosticCode::SigningKeyUnsupportedAlg => {
                "Signing key algorithm not supported for UCP (use ES256, ES384, or ES512)"
            }
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_name_matches_as_str() {
        let codes = [
            DiagnosticCode::UcpOrderMissingSigningKeys,
            DiagnosticCode::OrderNoSupportedKeys,
            DiagnosticCode::Ap2SignatureInvalidFormat,
            DiagnosticCode::Ap2SignatureMissingKid,
            DiagnosticCode::Ap2SignatureKeyNotFound,
            DiagnosticCode::Ap2SignatureVerificationFailed,
            DiagnosticCode::Ap2SignatureUnsupportedAlg,
            DiagnosticCode::Ap2MandateInvalidFormat,
            DiagnosticCode::Ap2MandateMissing,
            DiagnosticCode::Ap2MandateInvalidSdjwt,
            DiagnosticCode::SigningKeyInvalidJwk,
            DiagnosticCode::SigningKeyUnsupportedAlg,
        ];
        for code in codes {
            let json = serde_json::to_string(&code).expect("serialize");
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            assert!(!code.message().is_empty());
        }
    }
}
