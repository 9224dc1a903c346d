//! Configuration loading and overrides.

use std::collections::HashMap;
use std::io::Write;

use tempfile::NamedTempFile;

use pickem::PickemConfig;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = PickemConfig::default();
    assert_eq!(config.database_path(), "pickem.db");
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.port(), 3000);
    assert_eq!(config.log_filter(), "info,pickem=debug");
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = PickemConfig::from_toml("port = 8080\n").expect("Parse failed");
    assert_eq!(*config.port(), 8080);
    assert_eq!(config.database_path(), "pickem.db");
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "database_path = \"/var/lib/pickem/data.db\"\nhost = \"0.0.0.0\"")
        .expect("Write failed");
    let config = PickemConfig::from_file(file.path()).expect("Load failed");
    assert_eq!(config.database_path(), "/var/lib/pickem/data.db");
    assert_eq!(config.host(), "0.0.0.0");
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(PickemConfig::from_toml("port = \"eighty\"").is_err());
    assert!(PickemConfig::from_toml("database_path = \"\"").is_err());
}

#[test]
fn test_env_overrides_file_values() {
    let config = PickemConfig::from_toml("port = 8080\nhost = \"0.0.0.0\"")
        .expect("Parse failed")
        .apply_env(env(&[
            ("PICKEM_PORT", "9090"),
            ("PICKEM_DATABASE_PATH", "override.db"),
            ("PICKEM_LOG", "warn"),
        ]))
        .expect("Override failed");

    assert_eq!(*config.port(), 9090);
    assert_eq!(config.database_path(), "override.db");
    assert_eq!(config.log_filter(), "warn");
    assert_eq!(config.host(), "0.0.0.0");
}

#[test]
fn test_env_invalid_port() {
    let err = PickemConfig::default()
        .apply_env(env(&[("PICKEM_PORT", "not-a-port")]))
        .expect_err("Bad port should fail");
    assert!(err.message.contains("PICKEM_PORT"));
}

#[test]
fn test_setters_chain() {
    let config = PickemConfig::default()
        .with_database_path("cli.db")
        .with_port(4000u16);
    assert_eq!(config.database_path(), "cli.db");
    assert_eq!(*config.port(), 4000);
}

#[test]
fn test_load_without_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("absent.toml");
    let config = PickemConfig::load(Some(missing.as_path())).expect("Load failed");
    let expected = PickemConfig::default()
        .apply_env(|key| std::env::var(key).ok())
        .expect("Override failed");
    assert_eq!(config, expected);
}
