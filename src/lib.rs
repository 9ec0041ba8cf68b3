//! # provconf - Provider Configuration & Secret Resolution
//!
//! The configuration core of a DNS-synchronization admin tool: register
//! credentialed DNS provider backends, validate their configuration against
//! static schemas, and keep the secrets those providers need encrypted at
//! rest.
//!
//! ## Components
//!
//! - **Schema registry**: per-provider-type schema documents (fields,
//!   requiredness, types) composed with the installed package version and
//!   the operator's enable/disable map
//! - **Config validator**: schema-driven validation that accumulates all
//!   violations in one pass
//! - **Key resolution**: a strict priority chain for the process-wide
//!   encryption key (explicit > host secrets file > local key file >
//!   generate-and-persist)
//! - **Secret vault**: AES-256-GCM encrypted storage of named secrets
//! - **Reference resolution**: configuration values of the form `env/NAME`
//!   resolve to stored secrets only at point of use
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use provconf::{
//!     FsPackageIndex, KeyResolutionConfig, SchemaRegistry, SecretVault,
//!     resolve_value,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> provconf::Result<()> {
//! let registry = SchemaRegistry::new(
//!     "/data/provider_schemas",
//!     Arc::new(FsPackageIndex::new("/data/packages.json")),
//! )
//! .with_enable_map("/data/options.yaml");
//!
//! // Validate operator-submitted configuration
//! let config = serde_json::json!({
//!     "token": "env/CLOUDFLARE_TOKEN",
//! });
//! let errors = registry.validate_provider_config(
//!     "pkgns_cloudflare.CloudflareProvider",
//!     config.as_object().unwrap(),
//! );
//! assert!(errors.is_empty());
//!
//! // Store a secret and resolve the reference at point of use
//! let vault = SecretVault::open(
//!     &KeyResolutionConfig::new("/data"),
//!     "/data/secrets.json",
//! )?;
//! vault.set("CLOUDFLARE_TOKEN", "tok-abc123")?;
//!
//! let resolution = resolve_value(&config["token"], &vault);
//! assert_eq!(resolution.as_str(), Some("tok-abc123"));
//! # Ok(())
//! # }
//! ```
//!
//! Stored configuration never contains plaintext secrets - only literal
//! values or `env/` references. Decrypting under a different key than the
//! one that encrypted fails with an explicit error; the key resolution
//! chain never silently regenerates a key that would orphan existing
//! ciphertext.

mod error;
mod forms;
mod resolve;
pub mod security;
mod validate;

// Grouped modules
pub mod schema;
pub mod secrets;

pub use error::{Error, Result};
pub use forms::extract_config;
pub use resolve::{
    ConfigValue, ENV_REF_PREFIX, Resolution, resolve_config, resolve_config_strict, resolve_value,
};
pub use schema::{
    FieldSpec, FieldType, FsPackageIndex, PackageIndex, PackageSpec, ProviderCapabilities,
    ProviderInfo, ProviderSchema, RegistryLoad, SchemaRegistry, StaticPackageIndex,
    short_provider_name,
};
pub use secrets::{
    FileSecretStore, KeyResolutionConfig, MemorySecretStore, SecretCipher, SecretRef, SecretStore,
    SecretVault, generate_key_string, normalize_secret_name, resolve_key,
};
pub use validate::{ConfigMap, validate_config};
