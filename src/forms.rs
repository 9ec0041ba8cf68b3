//! Form-extraction boundary
//!
//! Turns a flat string/string form submission into a typed configuration
//! map, guided by the schema's field list. This is where checkbox coercion
//! happens; the validator downstream assumes it already did.

use crate::schema::{FieldSpec, FieldType};
use crate::validate::ConfigMap;
use serde_json::Value;
use std::collections::HashMap;

fn number_value(text: &str) -> Value {
    // Prefer integers, fall back to float; anything else stays a string so
    // the validator can report it
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = text.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(text.to_string())
}

/// Extract a configuration map from a form submission
///
/// Only fields named in the schema are considered; values are trimmed.
/// Checkboxes always produce a boolean (`"on"` is true, anything else,
/// including absence, is false). Empty non-checkbox values are omitted
/// entirely so that required-field checks see them as absent.
#[must_use]
pub fn extract_config(fields: &[FieldSpec], form: &HashMap<String, String>) -> ConfigMap {
    let mut config = ConfigMap::new();

    for field in fields {
        let raw = form.get(&field.name).map(|v| v.trim());

        if field.field_type == FieldType::Checkbox {
            config.insert(
                field.name.clone(),
                Value::Bool(raw == Some("on")),
            );
            continue;
        }

        let Some(text) = raw else { continue };
        if text.is_empty() {
            continue;
        }

        let value = match field.field_type {
            FieldType::Number => number_value(text),
            _ => Value::String(text.to_string()),
        };
        config.insert(field.name.clone(), value);
    }

    config
}

// =============================================================================
// Tests
// =============================================================================
