//! Schema registry: lookup and enumeration of provider type schemas
//!
//! All paths are injected at construction so tests can point the registry
//! at fixture directories. The registry holds no cache; every lookup reads
//! the filesystem, since schema files, the enable map and the package index
//! may all change between calls.

use crate::error::{Error, Result};
use crate::schema::packages::PackageIndex;
use crate::schema::types::{ProviderCapabilities, ProviderInfo, ProviderSchema};
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Conventional module prefix stripped when deriving a short provider name
pub const PROVIDER_MODULE_PREFIX: &str = "pkgns_";

/// File extension of schema documents
const SCHEMA_EXTENSION: &str = "yaml";

/// Short provider name derived from a class identifier
///
/// `pkgns_cloudflare.CloudflareProvider` becomes `cloudflare`. The short
/// name keys the operator's enable/disable map.
#[must_use]
pub fn short_provider_name(class_name: &str) -> String {
    let module = class_name.split('.').next().unwrap_or(class_name);
    module
        .strip_prefix(PROVIDER_MODULE_PREFIX)
        .unwrap_or(module)
        .to_string()
}

/// Result of a best-effort schema enumeration
///
/// Malformed or empty schema files never abort the load; they are skipped
/// and reported in `warnings` so callers can surface "N provider types
/// failed to load" without failing the whole listing.
#[derive(Debug, Default)]
pub struct RegistryLoad {
    /// Successfully loaded schemas, ordered by class identifier
    pub schemas: Vec<ProviderSchema>,
    /// One message per skipped schema source
    pub warnings: Vec<String>,
}

/// Registry over the static provider schema directory
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    enable_map_path: Option<PathBuf>,
    packages: Arc<dyn PackageIndex>,
}

impl SchemaRegistry {
    /// Create a registry reading schemas from `schema_dir`
    pub fn new(schema_dir: impl Into<PathBuf>, packages: Arc<dyn PackageIndex>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            enable_map_path: None,
            packages,
        }
    }

    /// Set the path of the operator's enable/disable map
    ///
    /// The map is a YAML document with a `providers` key holding short
    /// provider names mapped to booleans. When no path is set, or the file
    /// is absent or unreadable, every provider type defaults to enabled.
    #[must_use]
    pub fn with_enable_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.enable_map_path = Some(path.into());
        self
    }

    fn schema_path(&self, class_name: &str) -> PathBuf {
        let module = class_name.split('.').next().unwrap_or(class_name);
        self.schema_dir.join(format!("{module}.{SCHEMA_EXTENSION}"))
    }

    /// Load the schema for a provider class identifier
    ///
    /// Returns `Ok(None)` when no schema file exists for the identifier's
    /// module segment.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileRead` / `Error::SchemaParse` / `Error::InvalidSchema`
    /// when the file exists but cannot be used.
    pub fn load_schema(&self, class_name: &str) -> Result<Option<ProviderSchema>> {
        let path = self.schema_path(class_name);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;

        let schema: ProviderSchema =
            serde_yaml::from_str(&content).map_err(|e| Error::SchemaParse {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        schema.validate().map_err(|reason| Error::InvalidSchema {
            class_name: schema.class_name.clone(),
            reason,
        })?;

        Ok(Some(schema))
    }

    /// Load the schema for a class identifier, treating absence as an error
    ///
    /// # Errors
    ///
    /// Returns `Error::SchemaNotFound` for an unknown identifier, plus the
    /// errors of [`load_schema`](Self::load_schema).
    pub fn require_schema(&self, class_name: &str) -> Result<ProviderSchema> {
        self.load_schema(class_name)?
            .ok_or_else(|| Error::SchemaNotFound(class_name.to_string()))
    }

    /// Enumerate every available schema, best-effort
    ///
    /// Files that are missing a class identifier, empty, or otherwise
    /// malformed are skipped with a warning instead of failing the load.
    pub fn load_all_schemas(&self) -> RegistryLoad {
        let mut load = RegistryLoad::default();

        let entries = match std::fs::read_dir(&self.schema_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Schema directory '{}' is not readable: {e}",
                    self.schema_dir.display()
                );
                return load;
            }
        };

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCHEMA_EXTENSION) {
                continue;
            }

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    load.warnings
                        .push(format!("{}: {e}", path.display()));
                    continue;
                }
            };

            let schema: ProviderSchema = match serde_yaml::from_str(&content) {
                Ok(schema) => schema,
                Err(e) => {
                    load.warnings.push(format!("{}: {e}", path.display()));
                    continue;
                }
            };

            if let Err(reason) = schema.validate() {
                load.warnings
                    .push(format!("{}: {reason}", path.display()));
                continue;
            }

            load.schemas.push(schema);
        }

        for warning in &load.warnings {
            warn!("Skipped provider schema: {warning}");
        }

        load.schemas.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        load
    }

    /// Load the operator's enable/disable map
    ///
    /// Absence of the map (no path configured, file missing, or unreadable)
    /// yields an empty map, which means every provider type is enabled.
    #[must_use]
    pub fn enabled_providers(&self) -> HashMap<String, bool> {
        let Some(path) = &self.enable_map_path else {
            return HashMap::new();
        };
        if !path.exists() {
            return HashMap::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read enable map '{}': {e}", path.display());
                return HashMap::new();
            }
        };

        #[derive(serde::Deserialize, Default)]
        struct EnableMap {
            #[serde(default)]
            providers: HashMap<String, bool>,
        }

        match serde_yaml::from_str::<EnableMap>(&content) {
            Ok(map) => map.providers,
            Err(e) => {
                warn!("Failed to parse enable map '{}': {e}", path.display());
                HashMap::new()
            }
        }
    }

    fn info_from_schema(
        &self,
        schema: ProviderSchema,
        enabled_map: &HashMap<String, bool>,
    ) -> ProviderInfo {
        let short_name = short_provider_name(&schema.class_name);
        let is_enabled = enabled_map.get(&short_name).copied().unwrap_or(true);
        let installed_version = self.packages.installed_version(&schema.package.name);
        let capabilities = ProviderCapabilities::from_schema(&schema);

        ProviderInfo {
            schema,
            installed_version,
            is_enabled,
            capabilities,
        }
    }

    /// Complete information about one provider type
    ///
    /// Composes the static schema with the installed package version and the
    /// enable flag. Recomputed per call, never cached.
    ///
    /// # Errors
    ///
    /// Same as [`load_schema`](Self::load_schema); `Ok(None)` for an unknown
    /// identifier.
    pub fn provider_info(&self, class_name: &str) -> Result<Option<ProviderInfo>> {
        let Some(schema) = self.load_schema(class_name)? else {
            return Ok(None);
        };
        let enabled_map = self.enabled_providers();
        Ok(Some(self.info_from_schema(schema, &enabled_map)))
    }

    /// Information for all available provider types, best-effort
    pub fn all_provider_info(&self) -> (Vec<ProviderInfo>, Vec<String>) {
        let load = self.load_all_schemas();
        let enabled_map = self.enabled_providers();

        let providers = load
            .schemas
            .into_iter()
            .map(|schema| self.info_from_schema(schema, &enabled_map))
            .collect();

        (providers, load.warnings)
    }

    /// Information for enabled provider types only
    pub fn enabled_provider_info(&self) -> (Vec<ProviderInfo>, Vec<String>) {
        let (providers, warnings) = self.all_provider_info();
        (
            providers.into_iter().filter(|p| p.is_enabled).collect(),
            warnings,
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::packages::StaticPackageIndex;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    fn write_schema(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    fn fixture_registry() -> (TempDir, SchemaRegistry) {
        let dir = tempdir().unwrap();
        write_schema(
            dir.path(),
            "pkgns_cloudflare.yaml",
            r#"
class: pkgns_cloudflare.CloudflareProvider
name: Cloudflare
is_source: true
package:
  name: pkgns-cloudflare
fields:
  - name: token
    label: API Token
    type: password
    required: true
    env_ref: true
"#,
        );
        write_schema(
            dir.path(),
            "pkgns_route53.yaml",
            r#"
class: pkgns_route53.Route53Provider
name: Route53
package:
  name: pkgns-route53
"#,
        );

        let packages = Arc::new(StaticPackageIndex::new().with_package("pkgns-cloudflare", "1.4.0"));
        let registry = SchemaRegistry::new(dir.path(), packages);
        (dir, registry)
    }

    #[test]
    fn test_short_provider_name() {
        assert_eq!(
            short_provider_name("pkgns_cloudflare.CloudflareProvider"),
            "cloudflare"
        );
        // No conventional prefix: the module segment is the short name
        assert_eq!(short_provider_name("custom.MyProvider"), "custom");
        assert_eq!(short_provider_name("bare"), "bare");
    }

    #[test]
    fn test_load_schema_by_class() {
        let (_dir, registry) = fixture_registry();

        let schema = registry
            .load_schema("pkgns_cloudflare.CloudflareProvider")
            .unwrap()
            .unwrap();
        assert_eq!(schema.display_name(), "Cloudflare");
    }

    #[test]
    fn test_load_schema_unknown_is_none() {
        let (_dir, registry) = fixture_registry();
        assert!(
            registry
                .load_schema("pkgns_unknown.UnknownProvider")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_require_schema_unknown_is_not_found() {
        let (_dir, registry) = fixture_registry();
        let err = registry
            .require_schema("pkgns_unknown.UnknownProvider")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_all_schemas_skips_malformed() {
        let (dir, registry) = fixture_registry();
        write_schema(dir.path(), "broken.yaml", "{ not valid yaml");
        write_schema(dir.path(), "classless.yaml", "name: No Class\n");
        write_schema(dir.path(), "notes.txt", "not a schema");

        let load = registry.load_all_schemas();

        let classes: Vec<&str> = load
            .schemas
            .iter()
            .map(|s| s.class_name.as_str())
            .collect();
        assert_eq!(
            classes,
            vec![
                "pkgns_cloudflare.CloudflareProvider",
                "pkgns_route53.Route53Provider"
            ]
        );
        assert_eq!(load.warnings.len(), 2);
    }

    #[test]
    fn test_load_all_schemas_missing_dir() {
        let packages = Arc::new(StaticPackageIndex::new());
        let registry = SchemaRegistry::new("/nonexistent/schemas", packages);

        let load = registry.load_all_schemas();
        assert!(load.schemas.is_empty());
    }

    #[test]
    fn test_provider_info_composition() {
        let (_dir, registry) = fixture_registry();

        let info = registry
            .provider_info("pkgns_cloudflare.CloudflareProvider")
            .unwrap()
            .unwrap();
        assert_eq!(info.installed_version, Some("1.4.0".to_string()));
        assert!(info.is_enabled);
        assert!(info.capabilities.supports_env_ref);

        // Backing package not installed
        let info = registry
            .provider_info("pkgns_route53.Route53Provider")
            .unwrap()
            .unwrap();
        assert_eq!(info.installed_version, None);
        assert!(info.is_enabled);
    }

    #[test]
    fn test_enable_map_disables_provider() {
        let (dir, registry) = fixture_registry();
        let enable_path = dir.path().join("options.yaml");
        std::fs::write(
            &enable_path,
            "providers:\n  cloudflare: false\n  route53: true\n",
        )
        .unwrap();
        let registry = registry.with_enable_map(&enable_path);

        let info = registry
            .provider_info("pkgns_cloudflare.CloudflareProvider")
            .unwrap()
            .unwrap();
        assert!(!info.is_enabled);

        let (enabled, _) = registry.enabled_provider_info();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].schema.class_name, "pkgns_route53.Route53Provider");
    }

    #[test]
    fn test_enable_map_missing_entry_defaults_enabled() {
        let (dir, registry) = fixture_registry();
        let enable_path = dir.path().join("options.yaml");
        std::fs::write(&enable_path, "providers:\n  route53: false\n").unwrap();
        let registry = registry.with_enable_map(&enable_path);

        // cloudflare is not in the map: permissive default
        let info = registry
            .provider_info("pkgns_cloudflare.CloudflareProvider")
            .unwrap()
            .unwrap();
        assert!(info.is_enabled);
    }

    #[test]
    fn test_enable_map_unreadable_defaults_all_enabled() {
        let (dir, registry) = fixture_registry();
        let enable_path = dir.path().join("options.yaml");
        std::fs::write(&enable_path, "providers: [not, a, map]\n").unwrap();
        let registry = registry.with_enable_map(&enable_path);

        assert!(registry.enabled_providers().is_empty());
        let (enabled, _) = registry.enabled_provider_info();
        assert_eq!(enabled.len(), 2);
    }
}
