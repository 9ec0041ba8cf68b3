//! File-backed secret store
//!
//! Ciphertext blobs are kept in a single JSON document with secure
//! permissions. Writes are atomic (temp file + rename) so a crash never
//! leaves a half-written secrets file.

use crate::error::{Error, Result};
use crate::secrets::SecretStore;
use crate::security;
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::OffsetDateTime;

const STORE_VERSION: u32 = 1;

/// One stored secret: base64 ciphertext plus bookkeeping timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSecret {
    /// Base64-encoded ciphertext blob
    ciphertext: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// On-disk document format
#[derive(Debug, Default, Serialize, Deserialize)]
struct SecretsFile {
    version: u32,
    entries: BTreeMap<String, StoredSecret>,
}

/// Secret store persisting to a JSON file
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a store backed by the given file (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<SecretsFile> {
        if !self.path.exists() {
            return Ok(SecretsFile::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::FileRead {
            path: self.path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(Error::from)
    }

    fn save(&self, file: &mut SecretsFile) -> Result<()> {
        file.version = STORE_VERSION;

        if let Some(parent) = self.path.parent() {
            security::ensure_secure_dir(parent)?;
        }

        let content = serde_json::to_string_pretty(file)?;

        // Atomic write: temp file + rename
        let mut temp_name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        std::fs::write(&temp_path, &content).map_err(|e| Error::FileWrite {
            path: temp_path.clone(),
            source: e,
        })?;
        security::set_secure_file_permissions(&temp_path)?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| Error::FileWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl SecretStore for FileSecretStore {
    fn set(&self, key: &str, ciphertext: Vec<u8>) -> Result<()> {
        let mut file = self.load()?;
        let now = OffsetDateTime::now_utc();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&ciphertext);

        file.entries
            .entry(key.to_string())
            .and_modify(|entry| {
                entry.ciphertext = encoded.clone();
                entry.updated_at = now;
            })
            .or_insert(StoredSecret {
                ciphertext: encoded,
                created_at: now,
                updated_at: now,
            });

        self.save(&mut file)?;
        debug!("Secret stored: {key}");
        Ok(())
    }

    fn get_ciphertext(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let file = self.load()?;
        let Some(entry) = file.entries.get(key) else {
            return Ok(None);
        };

        let blob = base64::engine::general_purpose::STANDARD
            .decode(&entry.ciphertext)
            .map_err(|e| Error::Decryption(format!("stored ciphertext is not base64: {e}")))?;
        Ok(Some(blob))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut file = self.load()?;
        if file.entries.remove(key).is_some() {
            self.save(&mut file)?;
            debug!("Secret removed: {key}");
        }
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let file = self.load()?;
        Ok(file.entries.keys().cloned().collect())
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

// =============================================================================
// Tests
// =============================================================================
