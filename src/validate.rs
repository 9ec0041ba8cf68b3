//! Schema-driven validation of submitted provider configuration
//!
//! Validation walks the schema's fields in order and accumulates every
//! violation, so a caller can re-display the whole form with all messages
//! at once instead of fixing errors one by one.

use crate::error::Error;
use crate::schema::{FieldSpec, FieldType, ProviderSchema, SchemaRegistry};
use serde_json::{Map, Value};

/// Submitted configuration: a plain string-keyed map of JSON values
pub type ConfigMap = Map<String, Value>;

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parses_as_number(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        // Form submissions carry numbers as strings; integers are a special
        // case of float
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

fn check_field(field: &FieldSpec, value: &Value, errors: &mut Vec<String>) {
    match field.field_type {
        FieldType::Number => {
            if !parses_as_number(value) {
                errors.push(format!(
                    "Field '{}' must be a number",
                    field.display_label()
                ));
            }
        }
        FieldType::Select => {
            let matches_option = value
                .as_str()
                .is_some_and(|s| field.options.iter().any(|o| o == s));
            if !matches_option {
                errors.push(format!(
                    "Invalid selection for '{}'",
                    field.display_label()
                ));
            }
        }
        // Any scalar is acceptable; checkbox coercion happens at the
        // form-extraction boundary, not here
        FieldType::Text | FieldType::Password | FieldType::Checkbox => {}
    }
}

/// Validate a submitted configuration against a schema
///
/// Returns one message per violation, in schema field order; an empty list
/// means the configuration is valid. Non-required absent fields are not
/// errors, and type checks only apply to present, non-empty values.
#[must_use]
pub fn validate_config(schema: &ProviderSchema, config: &ConfigMap) -> Vec<String> {
    let mut errors = Vec::new();

    for field in &schema.fields {
        let value = config.get(&field.name);

        if field.required && is_blank(value) {
            errors.push(format!(
                "Field '{}' is required",
                field.display_label()
            ));
        }

        if let Some(value) = value {
            if !is_blank(Some(value)) {
                check_field(field, value, &mut errors);
            }
        }
    }

    errors
}

impl SchemaRegistry {
    /// Validate configuration for a provider type identified by class name
    ///
    /// An unknown or unreadable schema yields a single error naming the
    /// type, with no field-level checks attempted.
    #[must_use]
    pub fn validate_provider_config(&self, class_name: &str, config: &ConfigMap) -> Vec<String> {
        match self.load_schema(class_name) {
            Ok(Some(schema)) => validate_config(&schema, config),
            Ok(None) => vec![Error::SchemaNotFound(class_name.to_string()).to_string()],
            Err(e) => {
                // Degrade a broken schema source to "provider type unavailable"
                log::warn!("Schema for '{class_name}' could not be loaded: {e}");
                vec![Error::SchemaNotFound(class_name.to_string()).to_string()]
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
