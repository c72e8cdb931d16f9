//! Loosely structured documents.
//!
//! A document is a mapping from field name to a tagged JSON value. There is
//! no fixed schema: readers substitute defaults for absent or null fields
//! instead of rejecting the document.

use std::cmp::Ordering;

use serde_json::Value;

/// A schemaless record, keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Reads a string field, treating absent or null values as the empty string.
pub fn str_field<'a>(doc: &'a Document, field: &str) -> &'a str {
    doc.get(field).and_then(Value::as_str).unwrap_or("")
}

/// Reads a numeric field, treating absent or non-numeric values as zero.
pub fn f64_field(doc: &Document, field: &str) -> f64 {
    doc.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Total order over field values used for sort keys.
///
/// Values of the same kind compare naturally (strings lexicographic, numbers
/// by magnitude); values of different kinds compare by a fixed kind order so
/// that mixed collections still sort deterministically.
pub fn value_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
