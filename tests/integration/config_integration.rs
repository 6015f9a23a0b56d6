//! Integration tests for Configuration System

use super::test_utils::with_config_env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wood::config::{CdnConfig, ConfigLoader};
use wood::deploy::DeployOrdering;

const WORKSPACE_CONFIG: &str = r#"
[source]
root = "public"

[store]
directory = "bucket"

[invalidation]
collapse_threshold = 0.75
include_added = true

[deploy]
ordering = "concurrent"

[[cdn]]
provider = "dry_run"
name = "staging-edge"
max_patterns_per_request = 5

[[cdn]]
provider = "cloudflare"
zone_id = "zone-123"
url_prefix = "https://example.com/"
api_token = "token"
"#;

#[test]
fn test_workspace_config_loads_every_section() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    fs::write(workspace.join("wood.toml"), WORKSPACE_CONFIG).unwrap();

    let config = with_config_env(&temp_dir, || ConfigLoader::load(&workspace)).unwrap();

    assert_eq!(config.source_root(&workspace), Some(workspace.join("public")));
    assert_eq!(config.store_directory(&workspace), Some(workspace.join("bucket")));
    assert_eq!(config.invalidation.collapse_threshold, 0.75);
    assert_eq!(config.invalidation.min_changed_children, 2);
    assert!(config.invalidation.include_added);
    assert_eq!(config.deploy.ordering, DeployOrdering::Concurrent);
    assert_eq!(config.sync.max_concurrent, 8);

    assert_eq!(config.cdn.len(), 2);
    assert!(matches!(
        &config.cdn[0],
        CdnConfig::DryRun { name, max_patterns_per_request: 5 } if name == "staging-edge"
    ));
    assert!(matches!(&config.cdn[1], CdnConfig::Cloudflare(cf) if cf.zone_id == "zone-123"));

    assert!(config.validate().is_ok());
    let deploy = config.deploy_config();
    assert_eq!(deploy.aggregation.collapse_threshold, 0.75);
    assert_eq!(config.build_cdns().unwrap().len(), 2);
}

#[test]
fn test_global_config_is_overridden_by_workspace() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    let global_dir = temp_dir.path().join("config").join("wood");
    fs::create_dir_all(&global_dir).unwrap();
    fs::write(
        global_dir.join("config.toml"),
        "[sync]\nmax_concurrent = 2\n\n[source]\nroot = \"global-site\"\n",
    )
    .unwrap();
    fs::write(workspace.join("wood.toml"), "[source]\nroot = \"site\"\n").unwrap();

    let config = with_config_env(&temp_dir, || ConfigLoader::load(&workspace)).unwrap();

    assert_eq!(config.sync.max_concurrent, 2);
    assert_eq!(config.source.root, Some(PathBuf::from("site")));
}

#[test]
fn test_environment_specific_file_applies() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();
    fs::write(workspace.join("wood.toml"), "[deploy]\ndry_run = false\n").unwrap();
    fs::write(workspace.join("wood.production.toml"), "[deploy]\ndry_run = true\n").unwrap();

    let config = with_config_env(&temp_dir, || {
        std::env::set_var("WOOD_ENV", "production");
        ConfigLoader::load(&workspace)
    })
    .unwrap();

    assert!(config.deploy.dry_run);
}

#[test]
fn test_invalid_values_are_all_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    fs::write(
        &config_file,
        r#"
[invalidation]
collapse_threshold = 1.5
max_patterns_per_request = 0

[[cdn]]
provider = "cloudflare"
zone_id = ""
url_prefix = "example.com"
"#,
    )
    .unwrap();

    let config = with_config_env(&temp_dir, || ConfigLoader::load_from_file(&config_file)).unwrap();
    let errors = config.validate().unwrap_err();

    assert_eq!(errors.len(), 3);
    assert!(config.validated().is_err());
}
