//! Authenticated encryption of individual secret values
//!
//! AES-256-GCM with a per-value random nonce. The blob layout is
//! self-describing: `version || nonce (12 bytes) || ciphertext+tag`, so a
//! blob plus the key is all that is ever needed to decrypt.

use crate::error::{Error, Result};
use crate::secrets::key::{KEY_LEN, KeyResolutionConfig, resolve_key};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::Rng;

const BLOB_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric cipher over the process-wide secret key
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Create a cipher from raw key bytes
    #[must_use]
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Create a cipher by running key resolution
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyResolution` when no usable key can be obtained.
    pub fn from_resolution(config: &KeyResolutionConfig) -> Result<Self> {
        Ok(Self::new(&resolve_key(config)?))
    }

    /// Encrypt a plaintext string into a self-describing blob
    ///
    /// # Errors
    ///
    /// Returns `Error::Encryption` if the cipher rejects the input.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt)
    ///
    /// # Errors
    ///
    /// Returns `Error::Decryption` if the blob is malformed, was produced
    /// under a different key, or does not decode to UTF-8. A decryption
    /// failure is always surfaced explicitly, never as corrupted plaintext.
    pub fn decrypt(&self, blob: &[u8]) -> Result<String> {
        if blob.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(Error::Decryption("ciphertext blob too short".into()));
        }
        if blob[0] != BLOB_VERSION {
            return Err(Error::Decryption(format!(
                "unsupported ciphertext version {}",
                blob[0]
            )));
        }

        let nonce = Nonce::from_slice(&blob[1..1 + NONCE_LEN]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &blob[1 + NONCE_LEN..])
            .map_err(|_| {
                Error::Decryption("ciphertext rejected (wrong key or corrupted data)".into())
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::Decryption(format!("plaintext is not valid UTF-8: {e}")))
    }
}

// =============================================================================
// Tests
// =============================================================================
