//! Configuration loading and graceful degradation
//!
//! Tests that touch EVHUB_* environment variables are marked #[serial] so
//! they do not race each other.

use evhub_common::config::{
    load_config, resolve_config_path, TomlConfig, ENV_CATALOG_API_KEY, ENV_CATALOG_URL,
    ENV_CONFIG_PATH, ENV_DATABASE,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_CATALOG_API_KEY);
    env::remove_var(ENV_CATALOG_URL);
    env::remove_var(ENV_DATABASE);
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let config = load_config(Some(Path::new("/nonexistent/evhub/config.toml"))).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_no_path_uses_defaults() {
    clear_env();
    let config = load_config(None).unwrap();
    assert_eq!(config.catalog.page_size, 50);
}

#[test]
#[serial]
fn test_file_values_loaded() {
    clear_env();
    let file = write_config(
        r#"
        [catalog]
        api_key = "from-toml"
        default_city = "Berlin"
        page_size = 20

        [feed]
        legacy_source_marker = "old-importer"

        [logging]
        level = "debug"
        "#,
    );

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.catalog.valid_api_key(), Some("from-toml"));
    assert_eq!(config.catalog.default_city, "Berlin");
    assert_eq!(config.catalog.page_size, 20);
    assert_eq!(config.feed.legacy_source_marker, "old-importer");
    assert_eq!(config.logging.level, "debug");
    // Untouched sections keep their defaults
    assert_eq!(config.catalog.fetch_timeout_ms, 8_000);
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    clear_env();
    let file = write_config("[catalog\npage_size = ");
    let result = load_config(Some(file.path()));
    assert!(matches!(result, Err(evhub_common::Error::Config(_))));
}

#[test]
#[serial]
fn test_environment_overrides_toml() {
    clear_env();
    let file = write_config(
        r#"
        [catalog]
        api_key = "from-toml"
        base_url = "https://toml.example/events"
        "#,
    );

    env::set_var(ENV_CATALOG_API_KEY, "from-env");
    env::set_var(ENV_CATALOG_URL, "https://env.example/events");
    env::set_var(ENV_DATABASE, "/tmp/evhub-test.db");

    let config = load_config(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(config.catalog.valid_api_key(), Some("from-env"));
    assert_eq!(config.catalog.base_url, "https://env.example/events");
    assert_eq!(config.store.database_path, PathBuf::from("/tmp/evhub-test.db"));
}

#[test]
#[serial]
fn test_blank_env_key_does_not_override() {
    clear_env();
    let file = write_config(
        r#"
        [catalog]
        api_key = "from-toml"
        "#,
    );
    env::set_var(ENV_CATALOG_API_KEY, "   ");

    let config = load_config(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(config.catalog.valid_api_key(), Some("from-toml"));
}

#[test]
#[serial]
fn test_resolve_prefers_cli_then_env() {
    clear_env();
    let cli = PathBuf::from("/cli/config.toml");
    env::set_var(ENV_CONFIG_PATH, "/env/config.toml");

    assert_eq!(resolve_config_path(Some(cli.as_path())), Some(cli.clone()));
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/env/config.toml"))
    );

    clear_env();
}
