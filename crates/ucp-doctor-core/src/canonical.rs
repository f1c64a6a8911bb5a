//! Canonical JSON serialization (RFC 8785-class) and digest computation.
//!
//! The canonical form is the exact byte input to detached-signature
//! verification, so it must match what an independent signer produces:
//! - object keys ordered by UTF-16 code units (§3.2.3)
//! - numbers rendered with the ECMAScript shortest round-trip rules
//! - `-0` rendered as `0`; NaN and infinities rejected
//! - array order preserved, no insignificant whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{DoctorError, Result};

/// Convert a JSON value to its canonical string form.
pub fn canonicalize(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

/// Canonicalize an object after removing the named top-level keys.
///
/// Used to drop the field that carries a detached signature from the
/// payload it signs.
pub fn canonicalize_excluding(object: &Map<String, Value>, excluded: &[&str]) -> Result<String> {
    let mut filtered = object.clone();
    for key in excluded {
        filtered.remove(*key);
    }
    canonicalize(&Value::Object(filtered))
}

/// Compute the SHA-256 hex digest of the canonical form.
pub fn canonical_digest(value: &Value) -> Result<String> {
    let canonical = canonicalize(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Largest integer every double represents exactly (2^53).
const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// Render a single number the way the canonical form does.
pub fn canonicalize_f64(number: f64) -> Result<String> {
    if !number.is_finite() {
        return Err(DoctorError::NonFiniteNumber);
    }
    if number == 0.0 {
        // Covers -0.0 as well.
        return Ok("0".to_string());
    }

    let sign = if number < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", number.abs());
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => match e.parse::<i32>() {
            Ok(exp) => (m, exp),
            Err(_) => return Ok(format!("{number}")),
        },
        None => return Ok(format!("{number}")),
    };

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{int_part}.{frac_part}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let exp = n - 1;
        let exp_sign = if exp < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{exp_sign}{}", exp.abs())
        } else {
            format!("{lead}.{rest}e{exp_sign}{}", exp.abs())
        }
    };

    Ok(format!("{sign}{body}"))
}

fn write_value(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Number(n) => {
            if let Some(i) = n.as_i64().filter(|i| i.unsigned_abs() <= MAX_SAFE_INTEGER) {
                out.push_str(&i.to_string());
            } else if let Some(f) = n.as_f64() {
                // Integers past 2^53 render as the nearest double, like a JS signer.
                out.push_str(&canonicalize_f64(f)?);
            } else {
                return Err(DoctorError::NonFiniteNumber);
            }
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            // Sort by UTF-16 code unit order (RFC 8785)
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_value(&map[key], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}
