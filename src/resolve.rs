//! Resolution of `env/NAME` secret references in configuration values
//!
//! Stored provider configuration never embeds secret material; a field
//! either holds a literal value or the reference form `env/NAME`. The
//! reference is parsed once into [`ConfigValue`] at the boundary, and
//! resolved to plaintext only at point of use.

use crate::error::Result;
use crate::secrets::SecretVault;
use log::warn;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved prefix marking a configuration value as a secret reference
pub const ENV_REF_PREFIX: &str = "env/";

/// A configuration field value, parsed at the boundary
///
/// The reference case is an explicit variant rather than a string
/// convention re-detected throughout the system, so callers handle it
/// exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// A plain value, stored and used as-is
    Literal(Value),
    /// A reference to a stored secret by name; carries no ownership of the
    /// secret itself
    SecretRef(String),
}

impl ConfigValue {
    /// Parse a raw stored value
    ///
    /// Only strings starting with `env/` are references; any other value
    /// (including non-strings) is a literal.
    #[must_use]
    pub fn parse(raw: &Value) -> Self {
        match raw.as_str().and_then(|s| s.strip_prefix(ENV_REF_PREFIX)) {
            Some(key) => ConfigValue::SecretRef(key.to_string()),
            None => ConfigValue::Literal(raw.clone()),
        }
    }

    /// Whether this value is a secret reference
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, ConfigValue::SecretRef(_))
    }

    /// The value in its stored (persistable) form
    #[must_use]
    pub fn to_stored(&self) -> Value {
        match self {
            ConfigValue::Literal(value) => value.clone(),
            ConfigValue::SecretRef(key) => Value::String(format!("{ENV_REF_PREFIX}{key}")),
        }
    }
}

/// Outcome of resolving a single configuration value
///
/// The three cases need different user-facing handling:
/// - no reference: display/use the literal
/// - reference, resolved: use the plaintext, display the reference name
/// - reference, unresolvable: show a "broken reference", never treat as unset
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The usable value: the literal for pass-through, the decrypted
    /// plaintext for a resolved reference, `None` for a broken reference
    pub value: Option<Value>,

    /// Whether the raw value was an `env/` reference
    pub is_reference: bool,

    /// The referenced secret name, when `is_reference`
    pub referenced_key: Option<String>,
}

impl Resolution {
    fn passthrough(value: Value) -> Self {
        Self {
            value: Some(value),
            is_reference: false,
            referenced_key: None,
        }
    }

    fn resolved(key: String, plaintext: String) -> Self {
        Self {
            value: Some(Value::String(plaintext)),
            is_reference: true,
            referenced_key: Some(key),
        }
    }

    fn broken(key: String) -> Self {
        Self {
            value: None,
            is_reference: true,
            referenced_key: Some(key),
        }
    }

    /// A reference that could not be resolved (missing or undecryptable)
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.is_reference && self.value.is_none()
    }

    /// The resolved value as a string, if any
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

/// Resolve a single raw configuration value
///
/// Pass-through for literals. For references, looks up the secret in the
/// vault: a missing name and a decryption failure both yield a broken
/// reference (the distinction is logged but deliberately not part of the
/// return shape).
#[must_use]
pub fn resolve_value(raw: &Value, vault: &SecretVault) -> Resolution {
    match ConfigValue::parse(raw) {
        ConfigValue::Literal(value) => Resolution::passthrough(value),
        ConfigValue::SecretRef(key) => match vault.get(&key) {
            Ok(Some(plaintext)) => Resolution::resolved(key, plaintext),
            Ok(None) => {
                warn!("env reference '{key}' does not match any stored secret");
                Resolution::broken(key)
            }
            Err(e) => {
                warn!("env reference '{key}' is unrecoverable: {e}");
                Resolution::broken(key)
            }
        },
    }
}

/// Resolve every value of a provider configuration map
///
/// Broken references are carried through as such; callers decide whether
/// one broken reference fails the whole operation.
#[must_use]
pub fn resolve_config(config: &Map<String, Value>, vault: &SecretVault) -> BTreeMap<String, Resolution> {
    config
        .iter()
        .map(|(name, raw)| (name.clone(), resolve_value(raw, vault)))
        .collect()
}

/// Resolve a configuration map, failing on any broken reference
///
/// Convenience for consumers (e.g. sync-config generation) that cannot
/// proceed with missing secrets.
///
/// # Errors
///
/// Returns `Error::SecretNotFound` naming the first broken reference, in
/// field-name order.
pub fn resolve_config_strict(
    config: &Map<String, Value>,
    vault: &SecretVault,
) -> Result<BTreeMap<String, Value>> {
    let mut resolved = BTreeMap::new();
    for (name, resolution) in resolve_config(config, vault) {
        if resolution.is_broken() {
            let key = resolution.referenced_key.unwrap_or_default();
            return Err(crate::error::Error::SecretNotFound(key));
        }
        if let Some(value) = resolution.value {
            resolved.insert(name, value);
        }
    }
    Ok(resolved)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{MemorySecretStore, SecretCipher, SecretVault, key::KEY_LEN};
    use rand::Rng;
    use serde_json::json;
    use std::sync::Arc;

    fn vault_with(entries: &[(&str, &str)]) -> SecretVault {
        let key: [u8; KEY_LEN] = rand::rng().random();
        let vault =
            SecretVault::new(SecretCipher::new(&key), Arc::new(MemorySecretStore::new()));
        for (name, value) in entries {
            vault.set(name, value).unwrap();
        }
        vault
    }

    #[test]
    fn test_parse_literal_and_reference() {
        assert_eq!(
            ConfigValue::parse(&json!("plainvalue")),
            ConfigValue::Literal(json!("plainvalue"))
        );
        assert_eq!(
            ConfigValue::parse(&json!("env/FOO")),
            ConfigValue::SecretRef("FOO".to_string())
        );
        // Non-strings are always literals
        assert_eq!(
            ConfigValue::parse(&json!(42)),
            ConfigValue::Literal(json!(42))
        );
    }

    #[test]
    fn test_stored_form_roundtrip() {
        for raw in [json!("env/TOKEN"), json!("literal"), json!(8053), json!(true)] {
            assert_eq!(ConfigValue::parse(&raw).to_stored(), raw);
        }
    }

    #[test]
    fn test_resolve_passthrough() {
        let vault = vault_with(&[]);

        let r = resolve_value(&json!("plainvalue"), &vault);
        assert_eq!(r.value, Some(json!("plainvalue")));
        assert!(!r.is_reference);
        assert_eq!(r.referenced_key, None);

        // Non-string values pass through unchanged
        let r = resolve_value(&json!(42), &vault);
        assert_eq!(r.value, Some(json!(42)));
        assert!(!r.is_reference);
    }

    #[test]
    fn test_resolve_found_reference() {
        let vault = vault_with(&[("FOO", "plaintext-value")]);

        let r = resolve_value(&json!("env/FOO"), &vault);
        assert_eq!(r.as_str(), Some("plaintext-value"));
        assert!(r.is_reference);
        assert_eq!(r.referenced_key.as_deref(), Some("FOO"));
        assert!(!r.is_broken());
    }

    #[test]
    fn test_resolve_missing_reference_is_broken() {
        let vault = vault_with(&[]);

        let r = resolve_value(&json!("env/FOO"), &vault);
        assert_eq!(r.value, None);
        assert!(r.is_reference);
        assert_eq!(r.referenced_key.as_deref(), Some("FOO"));
        assert!(r.is_broken());
    }

    #[test]
    fn test_resolve_undecryptable_reference_is_broken() {
        // Store under one key, read under another
        let store = Arc::new(MemorySecretStore::new());
        let k1: [u8; KEY_LEN] = rand::rng().random();
        let k2: [u8; KEY_LEN] = rand::rng().random();
        SecretVault::new(SecretCipher::new(&k1), store.clone())
            .set("FOO", "value")
            .unwrap();
        let vault = SecretVault::new(SecretCipher::new(&k2), store);

        let r = resolve_value(&json!("env/FOO"), &vault);
        assert!(r.is_broken());
        assert_eq!(r.referenced_key.as_deref(), Some("FOO"));
    }

    #[test]
    fn test_resolve_config_mixed() {
        let vault = vault_with(&[("TOKEN", "tok-123")]);
        let config = json!({
            "token": "env/TOKEN",
            "email": "ops@example.com",
            "missing": "env/NOPE",
        });

        let resolved = resolve_config(config.as_object().unwrap(), &vault);
        assert_eq!(resolved["token"].as_str(), Some("tok-123"));
        assert!(!resolved["email"].is_reference);
        assert!(resolved["missing"].is_broken());
    }

    #[test]
    fn test_resolve_config_strict() {
        let vault = vault_with(&[("TOKEN", "tok-123")]);

        let ok = json!({"token": "env/TOKEN", "port": 8053});
        let resolved = resolve_config_strict(ok.as_object().unwrap(), &vault).unwrap();
        assert_eq!(resolved["token"], json!("tok-123"));
        assert_eq!(resolved["port"], json!(8053));

        let broken = json!({"token": "env/NOPE"});
        let err = resolve_config_strict(broken.as_object().unwrap(), &vault).unwrap_err();
        assert!(err.is_not_found());
    }
}
