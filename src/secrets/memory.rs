//! In-memory secret store for testing

use crate::error::{Error, Result};
use crate::secrets::SecretStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory secret storage (not persisted)
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySecretStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for MemorySecretStore {
    fn set(&self, key: &str, ciphertext: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::LockPoisoned)?;
        entries.insert(key.to_string(), ciphertext);
        Ok(())
    }

    fn get_ciphertext(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| Error::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Error::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| Error::LockPoisoned)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
