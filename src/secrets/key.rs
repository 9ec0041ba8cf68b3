//! Symmetric encryption key resolution
//!
//! The key used for secret encryption comes from a strict priority chain:
//!
//! 1. Explicit key in process configuration
//! 2. Entry in the host secrets file (e.g. `/config/secrets.yaml`)
//! 3. Local key file inside the managed data directory
//! 4. Generate a new key and persist it to the local key file
//!
//! Only absence advances to the next tier. A key that is present but
//! unusable is an error, never a reason to regenerate: regeneration would
//! silently orphan all existing ciphertext. All tiers carry the key in its
//! base64 textual form.

use crate::error::{Error, Result};
use crate::security;
use base64::Engine;
use log::{info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Conventional host secrets file path
pub const DEFAULT_HOST_SECRETS_PATH: &str = "/config/secrets.yaml";

/// Conventional entry name read from the host secrets file
pub const DEFAULT_KEY_ENTRY: &str = "provconf_secret_key";

/// Filename of the self-provisioned key inside the data directory
pub const KEY_FILE_NAME: &str = ".secret_key";

/// All inputs to key resolution, injected explicitly so tests can exercise
/// every tier deterministically
#[derive(Debug, Clone)]
pub struct KeyResolutionConfig {
    /// Operator-pinned key (base64, tier 1)
    pub explicit_key: Option<String>,

    /// Host secrets file path (tier 2)
    pub host_secrets_path: PathBuf,

    /// Entry name looked up in the host secrets file
    pub key_entry: String,

    /// Local key file path (tiers 3 and 4)
    pub key_file: PathBuf,
}

impl KeyResolutionConfig {
    /// Create a config with conventional paths under the given data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            explicit_key: None,
            host_secrets_path: PathBuf::from(DEFAULT_HOST_SECRETS_PATH),
            key_entry: DEFAULT_KEY_ENTRY.to_string(),
            key_file: data_dir.as_ref().join(KEY_FILE_NAME),
        }
    }

    /// Create a config under the platform data directory (fallback: cwd)
    #[must_use]
    pub fn for_app(app_name: &str) -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join(app_name))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(data_dir)
    }

    /// Pin an explicit key (base64 of 32 bytes)
    #[must_use]
    pub fn explicit_key(mut self, key: impl Into<String>) -> Self {
        self.explicit_key = Some(key.into());
        self
    }

    /// Override the host secrets file path
    #[must_use]
    pub fn host_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.host_secrets_path = path.into();
        self
    }

    /// Override the entry name read from the host secrets file
    #[must_use]
    pub fn key_entry(mut self, name: impl Into<String>) -> Self {
        self.key_entry = name.into();
        self
    }

    /// Override the local key file path
    #[must_use]
    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = path.into();
        self
    }
}

/// Generate a fresh key in its base64 textual form, for manual setup
/// (e.g. pasting into the host secrets file)
#[must_use]
pub fn generate_key_string() -> String {
    let key: [u8; KEY_LEN] = rand::rng().random();
    base64::engine::general_purpose::STANDARD.encode(key)
}

fn decode_key(text: &str) -> Result<[u8; KEY_LEN]> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| Error::KeyResolution(format!("invalid base64 key: {e}")))?;

    if bytes.len() != KEY_LEN {
        return Err(Error::KeyResolution(format!(
            "invalid key length: expected {KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Tier 2: host secrets file. Any read or parse failure is logged and
/// treated as absence - the host file is optional metadata, not ours.
fn load_host_secret(config: &KeyResolutionConfig) -> Option<[u8; KEY_LEN]> {
    let path = &config.host_secrets_path;
    if !path.exists() {
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read host secrets file '{}': {e}", path.display());
            return None;
        }
    };

    let secrets: HashMap<String, serde_yaml::Value> = match serde_yaml::from_str(&content) {
        Ok(secrets) => secrets,
        Err(e) => {
            warn!("Failed to parse host secrets file '{}': {e}", path.display());
            return None;
        }
    };

    let entry = secrets.get(&config.key_entry)?;
    let Some(text) = entry.as_str() else {
        warn!(
            "Host secrets entry '{}' is not a string, ignoring",
            config.key_entry
        );
        return None;
    };

    match decode_key(text) {
        Ok(key) => {
            info!("Using secret key from host secrets file");
            Some(key)
        }
        Err(e) => {
            warn!("Host secrets entry '{}' is unusable: {e}", config.key_entry);
            None
        }
    }
}

fn read_key_file(path: &Path) -> Result<[u8; KEY_LEN]> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::KeyResolution(format!("cannot read key file '{}': {e}", path.display()))
    })?;
    decode_key(&content)
}

/// Tier 4: generate a fresh key and persist it with owner-only permissions.
///
/// Create-exclusive open serializes concurrent first-time generation: the
/// loser of the race reads back the winner's key instead of producing a
/// second one.
fn generate_and_persist(path: &Path) -> Result<[u8; KEY_LEN]> {
    if let Some(parent) = path.parent() {
        security::ensure_secure_dir(parent).map_err(|e| {
            Error::KeyResolution(format!(
                "cannot create key directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let key: [u8; KEY_LEN] = rand::rng().random();
    let encoded = base64::engine::general_purpose::STANDARD.encode(key);

    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(mut file) => {
            file.write_all(encoded.as_bytes()).map_err(|e| {
                Error::KeyResolution(format!(
                    "cannot write key file '{}': {e}",
                    path.display()
                ))
            })?;
            drop(file);
            security::set_secure_file_permissions(path).map_err(|e| {
                Error::KeyResolution(format!(
                    "cannot secure key file '{}': {e}",
                    path.display()
                ))
            })?;
            info!("Generated new secret key at {}", path.display());
            Ok(key)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            // Lost the creation race; the winner's key is authoritative
            read_key_file(path)
        }
        Err(e) => Err(Error::KeyResolution(format!(
            "cannot create key file '{}': {e}",
            path.display()
        ))),
    }
}

/// Resolve the single symmetric key for this process
///
/// Walks the priority chain described in the module docs. Deterministic for
/// a fixed filesystem state; once any tier produced a key, later calls with
/// the same config return the same bytes.
///
/// # Errors
///
/// Returns `Error::KeyResolution` when a present key is unusable (bad
/// base64, wrong length, unreadable key file) or when generation is
/// required but the filesystem is unwritable. This is the one fatal error
/// in the crate.
pub fn resolve_key(config: &KeyResolutionConfig) -> Result<[u8; KEY_LEN]> {
    // 1. Operator-pinned key: used as-is, errors do not fall through
    if let Some(text) = &config.explicit_key {
        return decode_key(text);
    }

    // 2. Host secrets file: failures degrade to absence
    if let Some(key) = load_host_secret(config) {
        return Ok(key);
    }

    // 3. Local key file
    if config.key_file.exists() {
        return read_key_file(&config.key_file);
    }

    // 4. Self-provision
    generate_and_persist(&config.key_file)
}

// =============================================================================
// Tests
// =============================================================================
