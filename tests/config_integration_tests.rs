//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Defaults when no file exists
//! - Partial files filled in with defaults
//! - Saving and reloading
//! - Environment overrides

use camino::Utf8PathBuf;
use destiny_query::ConfigManager;
use destiny_query::config::CONFIG_FILE_NAME;
use destiny_query::models::EditorConfig;
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.config_path(), config_path.join(CONFIG_FILE_NAME));
}

#[test]
fn test_create_config_manager_makes_directory() {
    let (_temp_dir, root) = create_test_config_dir();
    let nested = root.join("Destiny Query Data");

    ConfigManager::new(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn test_missing_file_gives_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_config().unwrap();

    assert_eq!(config.editor.event_buffer, 100);
    assert_eq!(config.logging.log_dir, "logs");
    assert!(!config.logging.debug_mode);
    assert!(config.datasource.resource_base_url.ends_with("/resources"));
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(
        config_path.join(CONFIG_FILE_NAME),
        "datasource:\n  resource_base_url: \"https://grafana.example/api/datasources/uid/d2/resources\"\nlogging:\n  debug_mode: true\n",
    )
    .unwrap();

    let manager = ConfigManager::new(&config_path).unwrap();
    let config = manager.load_config().unwrap();

    assert_eq!(
        config.datasource.resource_base_url,
        "https://grafana.example/api/datasources/uid/d2/resources"
    );
    assert!(config.logging.debug_mode);
    assert_eq!(config.editor.event_buffer, 100);
    assert!(!config.logging.console_output);
}

#[test]
fn test_save_and_reload() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = EditorConfig::default();
    config.editor.event_buffer = 16;
    config.logging.console_output = true;
    manager.save_config(&config).unwrap();

    let saved = fs::read_to_string(manager.config_path()).unwrap();
    assert!(saved.contains("event_buffer: 16"));

    let reloaded = manager.load_config().unwrap();
    assert_eq!(reloaded.editor.event_buffer, 16);
    assert!(reloaded.logging.console_output);
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(config_path.join(CONFIG_FILE_NAME), "editor: [unterminated").unwrap();

    let manager = ConfigManager::new(&config_path).unwrap();

    assert!(manager.load_config().is_err());
}

#[test]
fn test_environment_overrides_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(
        config_path.join(CONFIG_FILE_NAME),
        "logging:\n  log_prefix: from-file\n",
    )
    .unwrap();

    // Only this test touches the variable, and only this test asserts on log_prefix
    unsafe {
        std::env::set_var("DESTINY_QUERY__LOGGING__LOG_PREFIX", "from-env");
    }
    let manager = ConfigManager::new(&config_path).unwrap();
    let config = manager.load_config();
    unsafe {
        std::env::remove_var("DESTINY_QUERY__LOGGING__LOG_PREFIX");
    }

    assert_eq!(config.unwrap().logging.log_prefix, "from-env");
}
