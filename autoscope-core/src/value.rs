//! Request values and blankness
//!
//! Request parameters arrive as untyped JSON. "Blank" follows the usual web
//! framework convention so that `?scope=` and `?scope` do not trigger a scope.

pub use serde_json::{Map, Value};

/// Returns true for `null`, `false`, whitespace-only strings, and empty
/// arrays or objects.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Negation of [`is_blank`].
pub fn is_present(value: &Value) -> bool {
    !is_blank(value)
}

/// Short name of a value's JSON kind, for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interpret a value as an unsigned integer.
///
/// Accepts JSON numbers and decimal strings (surrounding whitespace ignored).
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
