//! Router config loading from TOML files plus environment overrides.

use std::collections::HashMap;
use std::io::Write;

use plan_router::config::{ENV_MAX_REQUESTS, ENV_PERCENTILE_RANK};
use plan_router::{ConfigError, RouterConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
window_capacity = 50
percentile_rank = 10
max_delegation_ratio = 0.05
max_requests_before_reset = 1000
"#,
    );

    let config = RouterConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(
        config,
        RouterConfig {
            window_capacity: 50,
            percentile_rank: 10,
            max_delegation_ratio: 0.05,
            max_requests_before_reset: 1000,
        }
    );
}

#[test]
fn test_env_overrides_file_values() {
    let file = write_config("percentile_rank = 10\nmax_requests_before_reset = 1000\n");
    let env: HashMap<&str, &str> = [(ENV_PERCENTILE_RANK, "30")].into_iter().collect();

    let config = RouterConfig::from_toml_file(file.path())
        .unwrap()
        .with_env_overrides(|var| env.get(var).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.percentile_rank, 30);
    assert_eq!(config.max_requests_before_reset, 1000);
}

#[test]
fn test_env_override_revalidates() {
    let env: HashMap<&str, &str> = [(ENV_MAX_REQUESTS, "0")].into_iter().collect();
    let err = RouterConfig::default()
        .with_env_overrides(|var| env.get(var).map(|v| v.to_string()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("router.toml");

    let err = RouterConfig::from_toml_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("router.toml"));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let file = write_config("window_capacity = 10\nlog_level = \"debug\"\n");
    let config = RouterConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.window_capacity, 10);
}
