//! Schema-less structured values
//!
//! Structured records are string-to-JSON mappings validated at the boundary:
//! `serde_json::Value` is exactly the closed set of JSON-compatible kinds,
//! so anything that type-checks as `Fields` is storable.

use serde_json::Value;

use crate::error::{MemoryError, Result};

/// Value type stored under a `(namespace, key)` in the structured store
pub type Fields = serde_json::Map<String, Value>;

/// Convert an arbitrary JSON value into `Fields`
///
/// Rejects non-object values; pairs with `serde_json::json!` for building
/// records inline.
pub fn fields_from_value(value: Value) -> Result<Fields> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(MemoryError::other(format!(
            "structured values must be JSON objects, got: {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fields_from_object() {
        let fields = fields_from_value(json!({"theme": "dark", "verbosity": 2})).unwrap();
        assert_eq!(fields.get("theme"), Some(&json!("dark")));
        assert_eq!(fields.get("verbosity"), Some(&json!(2)));
    }

    #[test]
    fn test_fields_from_non_object_rejected() {
        assert!(fields_from_value(json!("just a string")).is_err());
        assert!(fields_from_value(json!([1, 2, 3])).is_err());
        assert!(fields_from_value(json!(null)).is_err());
    }

    #[test]
    fn test_nested_values_allowed() {
        let fields =
            fields_from_value(json!({"style": {"tone": "casual"}, "tags": ["a", "b"]})).unwrap();
        assert!(fields.get("style").unwrap().is_object());
        assert!(fields.get("tags").unwrap().is_array());
    }
}
