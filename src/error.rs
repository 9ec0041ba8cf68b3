//! Error types for the provconf library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for provconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the provconf library
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Unknown provider type: {0}")]
    SchemaNotFound(String),

    #[error("Failed to parse schema file '{path}': {reason}")]
    SchemaParse { path: PathBuf, reason: String },

    #[error("Invalid schema for '{class_name}': {reason}")]
    InvalidSchema { class_name: String, reason: String },

    // -------------------------------------------------------------------------
    // Secret Errors
    // -------------------------------------------------------------------------
    #[error("Invalid secret name '{0}': only letters, digits and underscores are allowed")]
    InvalidSecretName(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// The one fatal condition in this crate: without a key no secret
    /// operations are possible.
    #[error("Key resolution failed: {0}")]
    KeyResolution(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Internal lock was poisoned - possible thread panic. The operation may have left data in an inconsistent state.")]
    LockPoisoned,
}

impl Error {
    /// Check if this is a "not found" type error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SchemaNotFound(_) | Error::SecretNotFound(_))
    }

    /// Check if this error leaves the crate unable to perform secret
    /// operations at all
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::KeyResolution(_))
    }
}
