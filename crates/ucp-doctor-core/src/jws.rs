//! Detached JWS verification over canonical JSON payloads.
//!
//! A detached token has the shape `header..signature`: the payload segment is
//! empty and the signed bytes are the canonical encoding of the surrounding
//! document minus the fields that carry the signature. Verification
//! reconstructs `header_b64 + "." + base64url(canonical(payload))` and checks
//! the raw `r || s` ECDSA signature against a JWK public key.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::canonical::canonicalize_excluding;
use crate::model::SigningKey;

/// JWS algorithms this crate knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "ES256")]
    Es256,
    #[serde(rename = "ES384")]
    Es384,
    #[serde(rename = "ES512")]
    Es512,
    #[serde(rename = "RS256")]
    Rs256,
}

/// The only algorithms accepted for detached AP2 signatures.
pub const AP2_SIGNATURE_ALGORITHMS: &[SignatureAlgorithm] = &[
    SignatureAlgorithm::Es256,
    SignatureAlgorithm::Es384,
    SignatureAlgorithm::Es512,
];

/// Algorithms a declared signing key should use.
pub const RECOMMENDED_KEY_ALGORITHMS: &[SignatureAlgorithm] = &[
    SignatureAlgorithm::Es256,
    SignatureAlgorithm::Es384,
    SignatureAlgorithm::Es512,
    SignatureAlgorithm::Rs256,
];

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Es256 => "ES256",
            SignatureAlgorithm::Es384 => "ES384",
            SignatureAlgorithm::Es512 => "ES512",
            SignatureAlgorithm::Rs256 => "RS256",
        }
    }

    /// JWK curve name an EC algorithm requires.
    pub fn curve(&self) -> Option<&'static str> {
        match self {
            SignatureAlgorithm::Es256 => Some("P-256"),
            SignatureAlgorithm::Es384 => Some("P-384"),
            SignatureAlgorithm::Es512 => Some("P-521"),
            SignatureAlgorithm::Rs256 => None,
        }
    }

    /// EC algorithm for a JWK curve name.
    pub fn for_curve(crv: &str) -> Option<Self> {
        match crv {
            "P-256" => Some(SignatureAlgorithm::Es256),
            "P-384" => Some(SignatureAlgorithm::Es384),
            "P-521" => Some(SignatureAlgorithm::Es512),
            _ => None,
        }
    }

    pub fn is_ap2_allowed(&self) -> bool {
        AP2_SIGNATURE_ALGORITHMS.contains(self)
    }

    pub fn is_recommended(&self) -> bool {
        RECOMMENDED_KEY_ALGORITHMS.contains(self)
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = JwsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ES256" => Ok(SignatureAlgorithm::Es256),
            "ES384" => Ok(SignatureAlgorithm::Es384),
            "ES512" => Ok(SignatureAlgorithm::Es512),
            "RS256" => Ok(SignatureAlgorithm::Rs256),
            other => Err(JwsError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Parse and verification failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwsError {
    #[error("invalid detached JWS format, expected header..signature")]
    InvalidFormat,

    #[error("invalid JWS header: {0}")]
    InvalidHeader(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("key does not match algorithm {alg}")]
    KeyMismatch { alg: String },

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("invalid signature encoding")]
    InvalidSignature,
}

/// Decoded protected header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwsHeader {
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// A parsed `header..signature` token.
#[derive(Debug, Clone)]
pub struct DetachedJws {
    /// The header segment exactly as it appeared in the token.
    pub header_b64: String,
    pub header: JwsHeader,
    pub algorithm: SignatureAlgorithm,
    pub signature: Vec<u8>,
}

impl DetachedJws {
    pub fn kid(&self) -> Option<&str> {
        self.header.kid.as_deref().filter(|kid| !kid.is_empty())
    }
}

/// Split and decode a detached token.
///
/// Rejects anything other than three dot-separated parts with an empty
/// middle, a header without `alg`, and algorithms outside
/// [`AP2_SIGNATURE_ALGORITHMS`].
pub fn parse_detached_jws(token: &str) -> Result<DetachedJws, JwsError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || !parts[1].is_empty() || parts[0].is_empty() || parts[2].is_empty() {
        return Err(JwsError::InvalidFormat);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|e| JwsError::InvalidHeader(e.to_string()))?;
    let header: JwsHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| JwsError::InvalidHeader(e.to_string()))?;

    let algorithm = SignatureAlgorithm::from_str(&header.alg)?;
    if !algorithm.is_ap2_allowed() {
        return Err(JwsError::UnsupportedAlgorithm(header.alg.clone()));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| JwsError::InvalidSignature)?;

    Ok(DetachedJws {
        header_b64: parts[0].to_string(),
        header,
        algorithm,
        signature,
    })
}

/// The exact bytes a detached signature covers.
pub fn detached_signing_input(
    header_b64: &str,
    payload: &Map<String, Value>,
    excluded: &[&str],
) -> crate::error::Result<String> {
    let canonical = canonicalize_excluding(payload, excluded)?;
    Ok(format!(
        "{}.{}",
        header_b64,
        URL_SAFE_NO_PAD.encode(canonical.as_bytes())
    ))
}

/// Verify a detached token against `payload` minus `excluded` fields.
///
/// Never panics; any parse, policy, key or signature problem yields `false`.
pub fn verify_detached_jws(
    token: &str,
    payload: &Map<String, Value>,
    key: &SigningKey,
    excluded: &[&str],
) -> bool {
    match try_verify(token, payload, key, excluded) {
        Ok(valid) => valid,
        Err(err) => {
            tracing::debug!(error = %err, kid = %key.kid, "detached JWS rejected");
            false
        }
    }
}

fn try_verify(
    token: &str,
    payload: &Map<String, Value>,
    key: &SigningKey,
    excluded: &[&str],
) -> Result<bool, JwsError> {
    let jws = parse_detached_jws(token)?;
    let input = detached_signing_input(&jws.header_b64, payload, excluded)
        .map_err(|e| JwsError::InvalidHeader(e.to_string()))?;
    verify_signature(jws.algorithm, input.as_bytes(), &jws.signature, key)
}

/// Verify a raw `r || s` signature over `message` with an EC JWK.
pub fn verify_signature(
    algorithm: SignatureAlgorithm,
    message: &[u8],
    signature: &[u8],
    key: &SigningKey,
) -> Result<bool, JwsError> {
    let mismatch = || JwsError::KeyMismatch {
        alg: algorithm.as_str().to_string(),
    };

    if key.kty != "EC" || key.crv.as_deref() != algorithm.curve() {
        return Err(mismatch());
    }
    if let Some(alg) = key.alg.as_deref() {
        if alg != algorithm.as_str() {
            return Err(mismatch());
        }
    }

    let point = sec1_point(key, coordinate_len(algorithm))?;

    use p256::ecdsa::signature::Verifier;
    let valid = match algorithm {
        SignatureAlgorithm::Es256 => {
            let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map_err(|e| JwsError::InvalidKey(e.to_string()))?;
            let sig = p256::ecdsa::Signature::from_slice(signature)
                .map_err(|_| JwsError::InvalidSignature)?;
            vk.verify(message, &sig).is_ok()
        }
        SignatureAlgorithm::Es384 => {
            let vk = p384::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map_err(|e| JwsError::InvalidKey(e.to_string()))?;
            let sig = p384::ecdsa::Signature::from_slice(signature)
                .map_err(|_| JwsError::InvalidSignature)?;
            vk.verify(message, &sig).is_ok()
        }
        SignatureAlgorithm::Es512 => {
            let vk = p521::ecdsa::VerifyingKey::from_sec1_bytes(&point)
                .map_err(|e| JwsError::InvalidKey(e.to_string()))?;
            let sig = p521::ecdsa::Signature::from_slice(signature)
                .map_err(|_| JwsError::InvalidSignature)?;
            vk.verify(message, &sig).is_ok()
        }
        SignatureAlgorithm::Rs256 => return Err(JwsError::UnsupportedAlgorithm("RS256".into())),
    };
    Ok(valid)
}

fn coordinate_len(algorithm: SignatureAlgorithm) -> usize {
    match algorithm {
        SignatureAlgorithm::Es256 => 32,
        SignatureAlgorithm::Es384 => 48,
        SignatureAlgorithm::Es512 => 66,
        SignatureAlgorithm::Rs256 => 0,
    }
}

/// Uncompressed SEC1 encoding `0x04 || x || y` of a JWK's coordinates.
fn sec1_point(key: &SigningKey, len: usize) -> Result<Vec<u8>, JwsError> {
    let decode = |name: &str, field: Option<&String>| -> Result<Vec<u8>, JwsError> {
        let raw = field.ok_or_else(|| JwsError::InvalidKey(format!("missing {name}")))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|e| JwsError::InvalidKey(format!("{name}: {e}")))?;
        if bytes.len() != len {
            return Err(JwsError::InvalidKey(format!(
                "{name} is {} bytes, expected {len}",
                bytes.len()
            )));
        }
        Ok(bytes)
    };
    let x = decode("x", key.x.as_ref())?;
    let y = decode("y", key.y.as_ref())?;

    let mut point = Vec::with_capacity(1 + 2 * len);
    point.push(0x04);
    point.extend_from_slice(&x);
    point.extend_from_slice(&y);
    Ok(point)
}

/// Find a declared key by `kid`.
pub fn find_signing_key<'a>(keys: &'a [SigningKey], kid: &str) -> Option<&'a SigningKey> {
    keys.iter().find(|k| k.kid == kid)
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

/// EC keys carry curve and both coordinates.
pub fn is_valid_ec_key(key: &SigningKey) -> bool {
    key.kty == "EC" && present(&key.crv) && present(&key.x) && present(&key.y)
}

/// RSA keys carry modulus and exponent.
pub fn is_valid_rsa_key(key: &SigningKey) -> bool {
    key.kty == "RSA" && present(&key.n) && present(&key.e)
}

/// Whether a key could verify a detached AP2 signature: a well-formed EC key
/// on an allowed curve whose declared `alg`, if any, is allowed too.
pub fn supports_ap2_verification(key: &SigningKey) -> bool {
    if !is_valid_ec_key(key) {
        return false;
    }
    let by_curve = key
        .crv
        .as_deref()
        .and_then(SignatureAlgorithm::for_curve)
        .is_some_and(|alg| alg.is_ap2_allowed());
    let by_alg = match key.alg.as_deref() {
        Some(alg) => SignatureAlgorithm::from_str(alg).is_ok_and(|a| a.is_ap2_allowed()),
        None => true,
    };
    by_curve && by_alg
}

fn sd_jwt_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*\.[A-Za-z0-9_-]+(~[A-Za-z0-9_-]+)*$").ok()
        })
        .as_ref()
}

/// Structural SD-JWT(+kb) check: `b64.b64?.b64(~b64)*`.
pub fn validate_sd_jwt_format(token: &str) -> bool {
    sd_jwt_pattern().is_some_and(|re| re.is_match(token))
}
