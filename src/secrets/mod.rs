//! Secret storage: encryption key resolution, value encryption and the
//! persistent store of named secrets
//!
//! Operators store secrets under uppercase names (`CLOUDFLARE_TOKEN`), and
//! provider configuration references them as `env/CLOUDFLARE_TOKEN` instead
//! of embedding the value. Values are encrypted with the process-wide key
//! before they ever touch the store; plaintext is never persisted.

mod cipher;
mod file;
pub mod key;
mod memory;

pub use cipher::SecretCipher;
pub use file::FileSecretStore;
pub use key::{KeyResolutionConfig, generate_key_string, resolve_key};
pub use memory::MemorySecretStore;

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage backend for encrypted secret values
///
/// Implementations persist opaque ciphertext blobs by name; they never see
/// plaintext.
pub trait SecretStore: Send + Sync {
    /// Store (or replace) the ciphertext for a secret name
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the entry.
    fn set(&self, key: &str, ciphertext: Vec<u8>) -> Result<()>;

    /// Fetch the ciphertext for a secret name, `None` if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read the entry.
    fn get_ciphertext(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret; deleting an absent name is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to delete the entry.
    fn remove(&self, key: &str) -> Result<()>;

    /// List all stored secret names, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to enumerate entries.
    fn list_keys(&self) -> Result<Vec<String>>;

    /// Check whether a secret name exists
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read the entry.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get_ciphertext(key)?.is_some())
    }

    /// Backend name for logging/debugging
    fn store_name(&self) -> &'static str;
}

/// Normalize and validate a secret name
///
/// Names are uppercased and must contain only letters, digits and
/// underscores - the shape expected on the `env/NAME` reference side.
///
/// # Errors
///
/// Returns `Error::InvalidSecretName` for empty or malformed names.
pub fn normalize_secret_name(name: &str) -> Result<String> {
    let normalized = name.trim().to_uppercase();

    let valid = regex::Regex::new(r"^[A-Z0-9_]+$").expect("static pattern");
    if normalized.is_empty() || !valid.is_match(&normalized) {
        return Err(Error::InvalidSecretName(name.to_string()));
    }

    Ok(normalized)
}

/// A stored secret name together with its `env/` reference form, for
/// populating form dropdowns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretRef {
    /// Secret name, e.g. `CLOUDFLARE_TOKEN`
    pub key: String,
    /// Reference form, e.g. `env/CLOUDFLARE_TOKEN`
    pub reference: String,
}

/// Encrypting facade over a [`SecretStore`]
///
/// Pairs a cipher (holding the resolved process key) with a storage
/// backend. All plaintext enters and leaves through this type.
#[derive(Clone)]
pub struct SecretVault {
    cipher: Arc<SecretCipher>,
    store: Arc<dyn SecretStore>,
}

impl SecretVault {
    /// Create a vault from a cipher and a storage backend
    pub fn new(cipher: SecretCipher, store: Arc<dyn SecretStore>) -> Self {
        Self {
            cipher: Arc::new(cipher),
            store,
        }
    }

    /// Convenience constructor: resolve the key and use the file store
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyResolution` when no usable key can be obtained.
    pub fn open(
        key_config: &KeyResolutionConfig,
        secrets_path: impl Into<std::path::PathBuf>,
    ) -> Result<Self> {
        Ok(Self::new(
            SecretCipher::from_resolution(key_config)?,
            Arc::new(FileSecretStore::new(secrets_path)),
        ))
    }

    /// Encrypt and store a secret value under a name
    ///
    /// The name is normalized (uppercased, format-checked) first. Storing
    /// under an existing name replaces the value.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSecretName`, `Error::Encryption` or a storage
    /// error.
    pub fn set(&self, name: &str, plaintext: &str) -> Result<String> {
        let key = normalize_secret_name(name)?;
        let blob = self.cipher.encrypt(plaintext)?;
        self.store.set(&key, blob)?;
        debug!("Secret '{key}' stored in {} store", self.store.store_name());
        Ok(key)
    }

    /// Decrypt a stored secret, `None` if the name is unknown
    ///
    /// # Errors
    ///
    /// Returns `Error::Decryption` when ciphertext exists but cannot be
    /// read under the current key - a real data-loss condition, distinct
    /// from the name simply being absent.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let Some(blob) = self.store.get_ciphertext(name)? else {
            return Ok(None);
        };
        self.cipher.decrypt(&blob).map(Some)
    }

    /// Delete a stored secret
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to delete the entry.
    pub fn remove(&self, name: &str) -> Result<()> {
        self.store.remove(name)
    }

    /// Check whether a secret name exists (without decrypting)
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read the entry.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name)
    }

    /// List stored secret names, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to enumerate entries.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        self.store.list_keys()
    }

    /// Stored secrets in `env/NAME` reference form, for form dropdowns
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to enumerate entries.
    pub fn available_references(&self) -> Result<Vec<SecretRef>> {
        Ok(self
            .list_keys()?
            .into_iter()
            .map(|key| SecretRef {
                reference: format!("{}{key}", crate::resolve::ENV_REF_PREFIX),
                key,
            })
            .collect())
    }

    /// Access the underlying cipher (for callers resolving references)
    #[must_use]
    pub fn cipher(&self) -> &SecretCipher {
        &self.cipher
    }
}

// =============================================================================
// Tests
// =============================================================================
