//! Integration tests for configuration loading

use crate::integration::test_utils::with_isolated_env;
use basesync::config::{global_config_path, ConfigLoader, ConfigOverrides, ValidationError};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_global(test_dir: &TempDir, body: &str) {
    let dir = test_dir.path().join("config").join("basesync");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), body).unwrap();
}

#[test]
fn test_global_config_path_uses_xdg_config_home() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        assert_eq!(
            global_config_path().unwrap(),
            test_dir.path().join("config").join("basesync").join("config.toml")
        );
    });
}

#[test]
fn test_legacy_variables_complete_a_valid_config() {
    let test_dir = TempDir::new().unwrap();
    let base = test_dir.path().join("kb");
    std::fs::create_dir_all(&base).unwrap();

    with_isolated_env(&test_dir, || {
        std::env::set_var("BASE_PATH", &base);
        std::env::set_var("YANDEX_DISK_TOKEN", "token-123");

        let config = ConfigLoader::load(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.base_path.as_deref(), Some(base.as_path()));
        assert_eq!(config.remote.token.as_deref(), Some("token-123"));
        assert!(config.validate().is_ok());
    });
}

#[test]
fn test_missing_settings_are_all_reported() {
    let test_dir = TempDir::new().unwrap();
    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(None, &ConfigOverrides::default()).unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MissingBasePath, ValidationError::MissingToken]
        );
    });
}

#[test]
fn test_file_layers_and_flag_overrides() {
    let test_dir = TempDir::new().unwrap();
    write_global(
        &test_dir,
        r#"
base_path = "/from/global"

[remote]
token = "global-token"
root = "disk:/Knowledge"

[transfer]
workers = 2
max_attempts = 6

[logging]
level = "info"
format = "json"
"#,
    );
    let explicit = test_dir.path().join("project.toml");
    std::fs::write(&explicit, "[transfer]\nworkers = 5\n").unwrap();

    with_isolated_env(&test_dir, || {
        let config = ConfigLoader::load(Some(&explicit), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.base_path, Some(PathBuf::from("/from/global")));
        assert_eq!(config.remote.root, "disk:/Knowledge");
        assert_eq!(config.transfer.workers, 5);
        assert_eq!(config.transfer.max_attempts, 6);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.output, "stderr");

        std::env::set_var("BASESYNC_TRANSFER__WORKERS", "7");
        let config = ConfigLoader::load(Some(&explicit), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.transfer.workers, 7);

        let overrides = ConfigOverrides {
            base_path: Some(PathBuf::from("/from/flag")),
            workers: Some(1),
        };
        let config = ConfigLoader::load(Some(&explicit), &overrides).unwrap();
        assert_eq!(config.transfer.workers, 1);
        assert_eq!(config.base_path, Some(PathBuf::from("/from/flag")));
    });
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let test_dir = TempDir::new().unwrap();
    let explicit = test_dir.path().join("broken.toml");
    std::fs::write(&explicit, "[transfer\nworkers = ").unwrap();
    with_isolated_env(&test_dir, || {
        let err = ConfigLoader::load(Some(&explicit), &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, basesync::error::SyncError::Config(_)));
    });
}
