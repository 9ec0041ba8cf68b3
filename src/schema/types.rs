//! Provider schema types
//!
//! These deserialize from the external YAML schema documents, one per
//! provider type:
//!
//! ```yaml
//! class: pkgns_cloudflare.CloudflareProvider
//! name: Cloudflare
//! is_source: true
//! documentation: https://example.com/docs/cloudflare
//! package:
//!   name: pkgns-cloudflare
//!   git: https://example.com/src/pkgns-cloudflare
//! fields:
//!   - name: token
//!     label: API Token
//!     type: password
//!     required: true
//!     env_ref: true
//! ```

use serde::{Deserialize, Serialize};

/// Type of a configuration field, for validation and form rendering
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free-form text input
    #[default]
    Text,
    /// Numeric input (validated as float; integers are accepted)
    Number,
    /// Boolean toggle (coerced at the form-extraction boundary)
    Checkbox,
    /// Dropdown with a fixed option list
    Select,
    /// Text input rendered masked; typically holds an `env/` reference
    Password,
}

impl FieldType {
    /// Lowercase name as used in schema documents
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Checkbox => "checkbox",
            FieldType::Select => "select",
            FieldType::Password => "password",
        }
    }
}

/// A single configuration field definition within a provider schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// Field name, unique within the schema
    pub name: String,

    /// Human-readable label for forms and error messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Field type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Whether a non-empty value must be submitted
    #[serde(default)]
    pub required: bool,

    /// Allowed values (only meaningful for `select` fields)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Whether this field may hold an `env/NAME` secret reference
    #[serde(default)]
    pub env_ref: bool,
}

impl FieldSpec {
    /// Create a minimal field spec (mostly useful in tests)
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type,
            required: false,
            options: Vec::new(),
            env_ref: false,
        }
    }

    /// Label for display, falling back to the field name
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Mark the field as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display label
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the option list (for `select` fields)
    #[must_use]
    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Allow `env/NAME` references in this field
    #[must_use]
    pub fn env_ref(mut self) -> Self {
        self.env_ref = true;
        self
    }
}

/// Backing software package of a provider type, used for version lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PackageSpec {
    /// Package name in the runtime package index
    #[serde(default)]
    pub name: String,

    /// Upstream source URL
    #[serde(default, rename = "git", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Static description of a provider type, loaded from a schema document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSchema {
    /// Unique identifier, e.g. `pkgns_cloudflare.CloudflareProvider`.
    /// Opaque lookup key; its first `.`-segment names the schema file.
    #[serde(rename = "class")]
    pub class_name: String,

    /// Presentation name; falls back to `class_name` when absent
    #[serde(rename = "name", default)]
    pub display_name: String,

    /// Whether this provider type may act as a zone's authoritative source
    #[serde(default)]
    pub is_source: bool,

    /// Documentation URL
    #[serde(rename = "documentation", default)]
    pub documentation_url: String,

    /// Backing package
    #[serde(default)]
    pub package: PackageSpec,

    /// Ordered configuration field definitions
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ProviderSchema {
    /// Presentation name, falling back to the class identifier
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.class_name
        } else {
            &self.display_name
        }
    }

    /// Look up a field definition by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate the schema definition itself
    ///
    /// Checks that the class identifier is present, field names are unique
    /// and `select` fields carry options.
    pub fn validate(&self) -> Result<(), String> {
        if self.class_name.trim().is_empty() {
            return Err("schema has no class identifier".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err("field with empty name".to_string());
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("duplicate field name '{}'", field.name));
            }
            if field.field_type == FieldType::Select && field.options.is_empty() {
                return Err(format!(
                    "select field '{}' must have options defined",
                    field.name
                ));
            }
        }

        Ok(())
    }
}

/// Capability summary derived from a schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderCapabilities {
    /// Usable as a zone source
    pub is_source: bool,
    /// At least one field accepts an `env/` reference
    pub supports_env_ref: bool,
    /// Distinct field types appearing in the schema
    pub field_types: Vec<FieldType>,
}

impl ProviderCapabilities {
    /// Derive capabilities from a schema
    #[must_use]
    pub fn from_schema(schema: &ProviderSchema) -> Self {
        let mut field_types: Vec<FieldType> = Vec::new();
        for field in &schema.fields {
            if !field_types.contains(&field.field_type) {
                field_types.push(field.field_type);
            }
        }

        Self {
            is_source: schema.is_source,
            supports_env_ref: schema.fields.iter().any(|f| f.env_ref),
            field_types,
        }
    }
}

/// Complete information about a provider type
///
/// Combines the static schema with two volatile facts. Recomputed on every
/// lookup and never cached: installed packages or the enable map may change
/// between requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderInfo {
    /// The static schema
    pub schema: ProviderSchema,

    /// Version of the backing package, if installed
    pub installed_version: Option<String>,

    /// Whether the operator has this provider type enabled (default: true)
    pub is_enabled: bool,

    /// Derived capability summary
    pub capabilities: ProviderCapabilities,
}

// =============================================================================
// Tests
// =============================================================================
