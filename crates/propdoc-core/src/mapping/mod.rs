//! Field normalizer and mapper.
//!
//! Turns the loosely-typed [`FieldMap`] returned by the reasoning service into
//! a canonical record. Everything here is pure: no I/O, and the same input
//! always maps to the same output.

mod contract;
mod invoice;
mod lease;
pub mod values;

pub use contract::map_contract;
pub use invoice::map_invoice;
pub use lease::map_lease;
pub use values::{clean_currency, parse_date, remaining_balance};

use lazy_static::lazy_static;
use serde_json::{Map, Value};

use crate::error::MappingError;
use crate::models::FieldMap;
use crate::models::records::NOT_FOUND;

lazy_static! {
    /// The `"Not Found"` sentinel as a JSON value, for use as a lookup default.
    pub static ref NOT_FOUND_VALUE: Value = Value::String(NOT_FOUND.to_string());
}

/// Normalize one key: trim, lower-case, spaces to underscores.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}

/// Normalize every key of a map, recursing through nested maps and lists of maps.
pub fn normalize_keys(map: &FieldMap) -> FieldMap {
    map.iter()
        .map(|(key, value)| (normalize_key(key), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(inner) => Value::Object(normalize_keys(inner)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

/// Walk `keys` through nested objects.
///
/// Returns `None` at the first missing key or non-object step.
pub fn get_nested<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(data, |current, key| current.as_object()?.get(*key))
}

/// Like [`get_nested`] but yields `default` instead of `None`.
pub fn get_nested_or<'a>(data: &'a Value, keys: &[&str], default: &'a Value) -> &'a Value {
    get_nested(data, keys).unwrap_or(default)
}

/// Fetch an optional object group, failing if it has another shape.
pub(crate) fn group<'a>(
    fields: &'a FieldMap,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, MappingError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim() == NOT_FOUND => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(other) => Err(MappingError::Shape {
            field: key.to_string(),
            reason: format!("expected an object, got {}", type_name(other)),
        }),
    }
}

pub(crate) fn ensure_not_empty(fields: &FieldMap) -> Result<(), MappingError> {
    if fields.is_empty() {
        Err(MappingError::NothingExtracted)
    } else {
        Ok(())
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn as_map(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_normalize_keys_recursive() {
        let raw = as_map(json!({
            " Lease Type ": "Residential",
            "Rent Amount": {"Monthly Installment": "$1,200"},
            "Line Items": [{"Unit Price": 5}, "loose"]
        }));

        let normalized = normalize_keys(&raw);
        assert_eq!(
            Value::Object(normalized),
            json!({
                "lease_type": "Residential",
                "rent_amount": {"monthly_installment": "$1,200"},
                "line_items": [{"unit_price": 5}, "loose"]
            })
        );
    }

    #[test]
    fn test_get_nested_defaults() {
        let data = json!({"security_deposit": {"amount": "$500"}, "status": "late"});

        assert_eq!(get_nested(&data, &["security_deposit", "amount"]), Some(&json!("$500")));
        assert_eq!(
            get_nested_or(&data, &["security_deposit", "held_by"], &NOT_FOUND_VALUE),
            &json!("Not Found")
        );
        // Type mismatch part-way through the path.
        assert_eq!(get_nested(&data, &["status", "code"]), None);
        assert_eq!(get_nested_or(&data, &[], &NOT_FOUND_VALUE), &data);
    }

    #[test]
    fn test_group_shapes() {
        let fields = as_map(json!({
            "vendor_information": {"name": "Acme"},
            "tenant_information": "Not Found",
            "property_information": ["oops"]
        }));

        assert!(group(&fields, "vendor_information").unwrap().is_some());
        assert!(group(&fields, "tenant_information").unwrap().is_none());
        assert!(group(&fields, "missing").unwrap().is_none());
        assert!(matches!(
            group(&fields, "property_information"),
            Err(MappingError::Shape { .. })
        ));
    }
}
