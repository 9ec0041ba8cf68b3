//! Provider Configuration Integration Tests
//!
//! Exercises the full operator flow: schema enumeration, form extraction,
//! validation, secret storage and reference resolution.

use provconf::{
    KeyResolutionConfig, SchemaRegistry, SecretVault, StaticPackageIndex, extract_config,
    resolve_config, resolve_value,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CLOUDFLARE_SCHEMA: &str = r#"
class: pkgns_cloudflare.CloudflareProvider
name: Cloudflare
is_source: true
documentation: https://example.com/docs/cloudflare
package:
  name: pkgns-cloudflare
fields:
  - name: token
    label: API Token
    type: password
    required: true
    env_ref: true
  - name: plan
    label: Plan
    type: select
    options: [free, pro]
  - name: retry_count
    label: Retries
    type: number
  - name: lenient
    label: Lenient
    type: checkbox
"#;

const ROUTE53_SCHEMA: &str = r#"
class: pkgns_route53.Route53Provider
name: Route53
package:
  name: pkgns-route53
fields:
  - name: access_key_id
    label: Access Key ID
    type: text
    required: true
  - name: secret_access_key
    label: Secret Access Key
    type: password
    required: true
    env_ref: true
"#;

struct Fixture {
    dir: TempDir,
    registry: SchemaRegistry,
    vault: SecretVault,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let schema_dir = dir.path().join("provider_schemas");
        std::fs::create_dir_all(&schema_dir).unwrap();
        write_schema(&schema_dir, "pkgns_cloudflare.yaml", CLOUDFLARE_SCHEMA);
        write_schema(&schema_dir, "pkgns_route53.yaml", ROUTE53_SCHEMA);

        let packages =
            Arc::new(StaticPackageIndex::new().with_package("pkgns-cloudflare", "1.4.0"));
        let registry = SchemaRegistry::new(&schema_dir, packages);

        let data_dir = dir.path().join("data");
        let key_config = KeyResolutionConfig::new(&data_dir)
            .host_secrets_path(dir.path().join("no-secrets.yaml"));
        let vault = SecretVault::open(&key_config, data_dir.join("secrets.json")).unwrap();

        Self {
            dir,
            registry,
            vault,
        }
    }
}

fn write_schema(dir: &Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).unwrap();
}

fn form(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Registry Listing
// =============================================================================

#[test]
fn test_list_all_provider_types() {
    let fixture = Fixture::new();

    let (providers, warnings) = fixture.registry.all_provider_info();
    assert!(warnings.is_empty());
    assert_eq!(providers.len(), 2);

    // Ordered by class identifier
    assert_eq!(
        providers[0].schema.class_name,
        "pkgns_cloudflare.CloudflareProvider"
    );
    assert_eq!(providers[0].installed_version, Some("1.4.0".to_string()));
    assert!(providers[0].capabilities.supports_env_ref);

    // route53's backing package is not installed, but it still lists
    assert_eq!(providers[1].installed_version, None);
}

#[test]
fn test_broken_schema_degrades_to_warning() {
    let fixture = Fixture::new();
    write_schema(
        &fixture.dir.path().join("provider_schemas"),
        "pkgns_broken.yaml",
        "{ not yaml",
    );

    let (providers, warnings) = fixture.registry.all_provider_info();
    assert_eq!(providers.len(), 2);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("pkgns_broken.yaml"));
}

#[test]
fn test_enable_map_filters_listing() {
    let fixture = Fixture::new();
    let enable_path = fixture.dir.path().join("options.yaml");
    std::fs::write(&enable_path, "providers:\n  cloudflare: false\n").unwrap();

    // Without the map every provider is enabled
    let (enabled, _) = fixture.registry.enabled_provider_info();
    assert_eq!(enabled.len(), 2);

    let registry = SchemaRegistry::new(
        fixture.dir.path().join("provider_schemas"),
        Arc::new(StaticPackageIndex::new()),
    )
    .with_enable_map(&enable_path);

    let (enabled, _) = registry.enabled_provider_info();
    assert_eq!(enabled.len(), 1);
    assert_eq!(
        enabled[0].schema.class_name,
        "pkgns_route53.Route53Provider"
    );
}

// =============================================================================
// Submit Flow: Extract, Validate, Store
// =============================================================================

#[test]
fn test_submit_flow_accepts_valid_form() {
    let fixture = Fixture::new();
    let info = fixture
        .registry
        .provider_info("pkgns_cloudflare.CloudflareProvider")
        .unwrap()
        .unwrap();

    let config = extract_config(
        &info.schema.fields,
        &form(&[
            ("token", "env/CLOUDFLARE_TOKEN"),
            ("plan", "pro"),
            ("retry_count", "4"),
            ("lenient", "on"),
        ]),
    );

    let errors = fixture
        .registry
        .validate_provider_config("pkgns_cloudflare.CloudflareProvider", &config);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    // The stored config carries the reference, never the secret
    assert_eq!(config["token"], json!("env/CLOUDFLARE_TOKEN"));
    assert_eq!(config["retry_count"], json!(4));
    assert_eq!(config["lenient"], json!(true));
}

#[test]
fn test_submit_flow_collects_all_violations() {
    let fixture = Fixture::new();
    let info = fixture
        .registry
        .provider_info("pkgns_cloudflare.CloudflareProvider")
        .unwrap()
        .unwrap();

    // Missing token, bogus plan, non-numeric retries
    let config = extract_config(
        &info.schema.fields,
        &form(&[("plan", "enterprise"), ("retry_count", "lots")]),
    );

    let errors = fixture
        .registry
        .validate_provider_config("pkgns_cloudflare.CloudflareProvider", &config);
    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains("API Token"));
    assert!(errors[1].contains("Plan"));
    assert!(errors[2].contains("Retries"));
}

#[test]
fn test_submit_flow_unknown_type() {
    let fixture = Fixture::new();

    let errors = fixture
        .registry
        .validate_provider_config("pkgns_ghost.GhostProvider", &provconf::ConfigMap::new());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("pkgns_ghost.GhostProvider"));
}

// =============================================================================
// Secret Storage and Resolution
// =============================================================================

#[test]
fn test_end_to_end_reference_resolution() {
    let fixture = Fixture::new();
    fixture
        .vault
        .set("CLOUDFLARE_TOKEN", "tok-abc123")
        .unwrap();

    let config = json!({
        "token": "env/CLOUDFLARE_TOKEN",
        "plan": "pro",
        "missing": "env/NOT_STORED",
    });
    let resolved = resolve_config(config.as_object().unwrap(), &fixture.vault);

    // Resolved reference
    let token = &resolved["token"];
    assert!(token.is_reference);
    assert_eq!(token.as_str(), Some("tok-abc123"));
    assert_eq!(token.referenced_key.as_deref(), Some("CLOUDFLARE_TOKEN"));

    // Literal pass-through
    let plan = &resolved["plan"];
    assert!(!plan.is_reference);
    assert_eq!(plan.as_str(), Some("pro"));

    // Broken reference: not unset, broken
    let missing = &resolved["missing"];
    assert!(missing.is_broken());
    assert_eq!(missing.referenced_key.as_deref(), Some("NOT_STORED"));
}

#[test]
fn test_secrets_survive_process_restart() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let key_config = KeyResolutionConfig::new(&data_dir)
        .host_secrets_path(dir.path().join("no-secrets.yaml"));
    let secrets_path = data_dir.join("secrets.json");

    // First session stores; key is self-provisioned
    {
        let vault = SecretVault::open(&key_config, &secrets_path).unwrap();
        vault.set("HETZNER_TOKEN", "tok-xyz").unwrap();
    }

    // Second session resolves the persisted key and decrypts
    {
        let vault = SecretVault::open(&key_config, &secrets_path).unwrap();
        assert_eq!(
            vault.get("HETZNER_TOKEN").unwrap(),
            Some("tok-xyz".to_string())
        );
    }
}

#[test]
fn test_reference_dropdown_listing() {
    let fixture = Fixture::new();
    fixture.vault.set("CLOUDFLARE_TOKEN", "a").unwrap();
    fixture.vault.set("AWS_SECRET", "b").unwrap();

    let refs = fixture.vault.available_references().unwrap();
    let references: Vec<&str> = refs.iter().map(|r| r.reference.as_str()).collect();
    assert_eq!(references, vec!["env/AWS_SECRET", "env/CLOUDFLARE_TOKEN"]);
}

#[test]
fn test_deleted_secret_becomes_broken_reference() {
    let fixture = Fixture::new();
    fixture.vault.set("TOKEN", "value").unwrap();

    let raw = json!("env/TOKEN");
    assert!(!resolve_value(&raw, &fixture.vault).is_broken());

    fixture.vault.remove("TOKEN").unwrap();
    let resolution = resolve_value(&raw, &fixture.vault);
    assert!(resolution.is_broken());
    assert_eq!(resolution.referenced_key.as_deref(), Some("TOKEN"));
}
