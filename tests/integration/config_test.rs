use cputemp::core::config::{Config, DEFAULT_ENDPOINT_PATH, DEFAULT_SOCKET_MODE};
use cputemp::core::EndpointConfig;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.endpoint_path, PathBuf::from(DEFAULT_ENDPOINT_PATH));
    assert_eq!(config.socket_mode, DEFAULT_SOCKET_MODE);
    assert_eq!(config.msr_cpu, 0);
    assert!(config.serialize_hardware_access);
}

#[test]
fn test_config_load_nonexistent_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::load_from(&temp_dir.path().join("missing.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        endpoint_path: PathBuf::from("/tmp/cputemp-test.sock"),
        alias_path: PathBuf::from("/tmp/cputemp-alias.sock"),
        socket_mode: 0o660,
        msr_cpu: 2,
        serialize_hardware_access: false,
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_corrupted_config_falls_back_to_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    std::fs::write(&path, b"{ not json").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());

    std::fs::write(&path, b"").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_endpoint_config_from_config() {
    let mut config = Config::default();
    let endpoint = EndpointConfig::from(&config);
    assert_eq!(endpoint.path, config.endpoint_path);
    assert_eq!(endpoint.alias, Some(config.alias_path.clone()));
    assert_eq!(endpoint.mode, 0o600);

    // an alias equal to the endpoint, or empty, is skipped
    config.alias_path = config.endpoint_path.clone();
    assert_eq!(EndpointConfig::from(&config).alias, None);
    config.alias_path = PathBuf::new();
    assert_eq!(EndpointConfig::from(&config).alias, None);
}
