//! Tests for configuration loading and defaults.

use std::io::Write;

use libprobe_core::errors::error_code;
use libprobe_core::{ConfigError, ProbeConfig, ProbeErrorCode};

#[test]
fn test_defaults_apply_when_fields_absent() {
    let config = ProbeConfig::default();
    assert_eq!(
        config.effective_abi_dirs(),
        vec!["lib/arm64-v8a/".to_string(), "lib/x86_64/".to_string()]
    );
    assert_eq!(config.effective_max_file_size(), 200 * 1024 * 1024);
    assert_eq!(config.effective_max_aggregate_memory(), 512 * 1024 * 1024);
    assert_eq!(config.effective_kmp_marker_threshold(), 1);
    assert_eq!(config.effective_kmp_scan_timeout_ms(), 5_000);
    assert_eq!(config.effective_min_string_len(), 4);
}

#[test]
fn test_parse_full_config() {
    let toml = r#"
abi_dirs = ["lib/arm64-v8a", "lib/armeabi-v7a/"]
max_file_size = 1024
max_aggregate_memory = 4096
kmp_marker_threshold = 3
disabled_frameworks = ["qt"]
"#;
    let config = ProbeConfig::from_toml_str(toml).expect("should parse");
    assert_eq!(
        config.effective_abi_dirs(),
        vec!["lib/arm64-v8a/".to_string(), "lib/armeabi-v7a/".to_string()]
    );
    assert_eq!(config.effective_max_file_size(), 1024);
    assert_eq!(config.effective_max_aggregate_memory(), 4096);
    assert_eq!(config.effective_kmp_marker_threshold(), 3);
    assert_eq!(config.disabled_frameworks, vec!["qt".to_string()]);
}

#[test]
fn test_zero_limits_rejected() {
    let err = ProbeConfig::from_toml_str("max_file_size = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert_eq!(err.error_code(), error_code::CONFIG_ERROR);

    let err = ProbeConfig::from_toml_str("kmp_marker_threshold = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = ProbeConfig::from_toml_str("max_file_size = \"big\"").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));
    assert_eq!(err.error_code(), error_code::CONFIG_PARSE_ERROR);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ProbeConfig::load_from_dir(dir.path()).expect("missing file is not an error");
    assert_eq!(config, ProbeConfig::default());
}

#[test]
fn test_load_from_dir_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("libprobe.toml")).unwrap();
    writeln!(file, "max_file_size = 2048").unwrap();
    let config = ProbeConfig::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.effective_max_file_size(), 2048);
}
