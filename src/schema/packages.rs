//! Runtime package index lookups
//!
//! Whether a provider type is actually usable depends on its backing
//! package being installed. The index is consulted per request; lookup
//! failures are logged and degrade to "not installed" rather than
//! propagating.

use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;

/// Source of installed package versions
pub trait PackageIndex: Send + Sync {
    /// Version of the given package, or `None` if it is not installed
    fn installed_version(&self, package_name: &str) -> Option<String>;
}

/// Normalize a package name for index lookup (lowercase, `_` becomes `-`)
#[must_use]
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// Package index backed by an installed-packages JSON manifest
///
/// The manifest is a flat map from package name to version string, written
/// by the runtime's package inventory. A missing or unreadable manifest
/// means every lookup returns `None`.
pub struct FsPackageIndex {
    manifest_path: PathBuf,
}

impl FsPackageIndex {
    /// Create an index reading from the given manifest path
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }

    fn load_manifest(&self) -> Option<HashMap<String, String>> {
        if !self.manifest_path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&self.manifest_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to read package manifest '{}': {e}",
                    self.manifest_path.display()
                );
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(
                    "Failed to parse package manifest '{}': {e}",
                    self.manifest_path.display()
                );
                None
            }
        }
    }
}

impl PackageIndex for FsPackageIndex {
    fn installed_version(&self, package_name: &str) -> Option<String> {
        if package_name.is_empty() {
            return None;
        }

        let manifest = self.load_manifest()?;
        let normalized = normalize_package_name(package_name);
        manifest
            .iter()
            .find(|(name, _)| normalize_package_name(name) == normalized)
            .map(|(_, version)| version.clone())
    }
}

/// Fixed in-memory package index (for tests)
#[derive(Default)]
pub struct StaticPackageIndex {
    versions: HashMap<String, String>,
}

impl StaticPackageIndex {
    /// Create an empty index (nothing installed)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an installed package version
    #[must_use]
    pub fn with_package(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.versions
            .insert(normalize_package_name(&name.into()), version.into());
        self
    }
}

impl PackageIndex for StaticPackageIndex {
    fn installed_version(&self, package_name: &str) -> Option<String> {
        if package_name.is_empty() {
            return None;
        }
        self.versions
            .get(&normalize_package_name(package_name))
            .cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(normalize_package_name("Pkgns_CloudFlare"), "pkgns-cloudflare");
        assert_eq!(normalize_package_name("plain-name"), "plain-name");
    }

    #[test]
    fn test_fs_index_lookup() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("packages.json");
        std::fs::write(
            &manifest,
            r#"{"pkgns-cloudflare": "1.4.0", "pkgns-route53": "0.9.2"}"#,
        )
        .unwrap();

        let index = FsPackageIndex::new(&manifest);

        // Underscore form normalizes to the manifest's dash form
        assert_eq!(
            index.installed_version("pkgns_cloudflare"),
            Some("1.4.0".to_string())
        );
        assert_eq!(index.installed_version("pkgns-unknown"), None);
        assert_eq!(index.installed_version(""), None);
    }

    #[test]
    fn test_fs_index_missing_manifest_degrades() {
        let index = FsPackageIndex::new("/nonexistent/packages.json");
        assert_eq!(index.installed_version("pkgns-cloudflare"), None);
    }

    #[test]
    fn test_fs_index_malformed_manifest_degrades() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("packages.json");
        std::fs::write(&manifest, "not json at all").unwrap();

        let index = FsPackageIndex::new(&manifest);
        assert_eq!(index.installed_version("pkgns-cloudflare"), None);
    }

    #[test]
    fn test_static_index() {
        let index = StaticPackageIndex::new().with_package("pkgns_cloudflare", "2.0.0");

        assert_eq!(
            index.installed_version("pkgns-cloudflare"),
            Some("2.0.0".to_string())
        );
        assert_eq!(index.installed_version("other"), None);
    }
}
