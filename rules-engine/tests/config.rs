// tests/config.rs

use std::{io::Write, path::Path};

use rules::config::{self, ConfigError};
use tempfile::NamedTempFile;

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(body.as_bytes()).expect("write temp config");
    file
}

#[test]
fn shipped_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let settings = config::load(&path).expect("shipped config.toml must load");
    assert_eq!(settings.engine, rules::Config::default());
    assert!(!settings.logging.enable);
    assert_eq!(settings.logging.level_filter(), log::LevelFilter::Info);
}

#[test]
fn partial_tables_fall_back_to_defaults() {
    let file = write_config("[engine]\nsignature_buffer = 64\n\n[logging]\nenable = true\nlevel = \"debug\"\n");
    let settings = config::load(file.path()).expect("load");
    assert_eq!(settings.engine.signature_buffer, 64);
    assert_eq!(settings.engine.source_buffer, 1_000);
    assert!(settings.logging.enable);
    assert_eq!(settings.logging.file, None);
    assert_eq!(settings.logging.level_filter(), log::LevelFilter::Debug);
}

#[test]
fn empty_file_is_all_defaults() {
    let file = write_config("");
    let settings = config::load(file.path()).expect("load");
    assert_eq!(settings.engine, rules::Config::default());
}

#[test]
fn zero_buffer_is_rejected() {
    let file = write_config("[engine]\nsource_buffer = 0\n");
    match config::load(file.path()) {
        Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "engine.source_buffer"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_reported() {
    let file = write_config("[engine\nsignature_buffer = ");
    assert!(matches!(config::load(file.path()), Err(ConfigError::Toml(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let res = config::load(&dir.path().join("absent.toml"));
    assert!(matches!(res, Err(ConfigError::Io(_))));
}
