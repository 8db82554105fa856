//! Loosely-typed JSON documents and the coercions the legacy format needs.
//!
//! Vault files and decrypted payloads have no fixed schema: fields go
//! missing, numbers arrive as strings, flags arrive as `"Y"`. Reading them
//! never fails on a missing or mistyped field; values are coerced to the
//! target type with empty/zero defaults instead.

use serde_json::Value;

/// An ordered key → value JSON object.
///
/// Key order is the order found in the source text.
pub type Document = serde_json::Map<String, Value>;

/// Coerce to a string: `null`/missing → `""`, numbers and booleans →
/// their textual form, nested values → compact JSON.
#[must_use]
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Coerce to an integer timestamp: numbers are truncated, numeric strings
/// are parsed, booleans map to 0/1, everything else is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f as i64)
                })
                .unwrap_or(0)
        }
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// JSON truthiness: `false`, `null`, `0`, `""` and missing are false;
/// everything else is true.
#[must_use]
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Look up `key` in an optional object value.
pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object().and_then(|obj| obj.get(key))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
