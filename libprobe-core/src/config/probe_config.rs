//! Detection engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default file name looked up by [`ProbeConfig::load_from_dir`].
pub const CONFIG_FILE_NAME: &str = "libprobe.toml";

const DEFAULT_ABI_DIRS: &[&str] = &["lib/arm64-v8a/", "lib/x86_64/"];
const DEFAULT_MAX_FILE_SIZE: u64 = 200 * 1024 * 1024;
const DEFAULT_MAX_AGGREGATE_MEMORY: u64 = 512 * 1024 * 1024;
const DEFAULT_KMP_MARKER_THRESHOLD: usize = 1;
const DEFAULT_KMP_SCAN_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MIN_STRING_LEN: usize = 4;

/// Configuration for the detection engine. Every field is optional; use the
/// `effective_*` accessors to read values with defaults applied.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Archive directory prefixes whose libraries are analyzed.
    /// Default: the 64-bit ABIs `lib/arm64-v8a/` and `lib/x86_64/`.
    pub abi_dirs: Option<Vec<String>>,
    /// Per-library size ceiling in bytes. Default: 200 MiB.
    pub max_file_size: Option<u64>,
    /// Aggregate bytes that may be checked out at once. Default: 512 MiB.
    pub max_aggregate_memory: Option<u64>,
    /// Raw-byte marker occurrences needed to confirm Kotlin-Multiplatform. Default: 1.
    pub kmp_marker_threshold: Option<usize>,
    /// Deadline for the raw-byte KMP scan of one library, in milliseconds. Default: 5000.
    pub kmp_scan_timeout_ms: Option<u64>,
    /// Minimum printable run length kept by the default string extractor. Default: 4.
    pub min_string_len: Option<usize>,
    /// JSON file mapping Flutter engine build ids to release timestamps.
    pub version_table_path: Option<PathBuf>,
    /// Newline-separated list of known public Dart packages.
    /// When unset, the built-in catalog is used.
    pub package_catalog_path: Option<PathBuf>,
    /// Directory of extra `*.toml` framework rule packs.
    pub custom_rules_dir: Option<PathBuf>,
    /// Framework names whose rules are not loaded.
    #[serde(default)]
    pub disabled_frameworks: Vec<String>,
}

impl ProbeConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ProbeConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `libprobe.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Reject values that would make every library fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size == Some(0) {
            return Err(ConfigError::Invalid("max_file_size must be > 0".into()));
        }
        if self.max_aggregate_memory == Some(0) {
            return Err(ConfigError::Invalid("max_aggregate_memory must be > 0".into()));
        }
        if self.kmp_marker_threshold == Some(0) {
            return Err(ConfigError::Invalid("kmp_marker_threshold must be > 0".into()));
        }
        if let Some(dirs) = &self.abi_dirs {
            if dirs.iter().any(|d| d.trim().is_empty()) {
                return Err(ConfigError::Invalid("abi_dirs entries must not be empty".into()));
            }
        }
        Ok(())
    }

    /// ABI directory prefixes, each normalized to end with `/`.
    pub fn effective_abi_dirs(&self) -> Vec<String> {
        match &self.abi_dirs {
            Some(dirs) => dirs
                .iter()
                .map(|d| {
                    if d.ends_with('/') {
                        d.clone()
                    } else {
                        format!("{d}/")
                    }
                })
                .collect(),
            None => DEFAULT_ABI_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    pub fn effective_max_aggregate_memory(&self) -> u64 {
        self.max_aggregate_memory.unwrap_or(DEFAULT_MAX_AGGREGATE_MEMORY)
    }

    pub fn effective_kmp_marker_threshold(&self) -> usize {
        self.kmp_marker_threshold.unwrap_or(DEFAULT_KMP_MARKER_THRESHOLD)
    }

    pub fn effective_kmp_scan_timeout_ms(&self) -> u64 {
        self.kmp_scan_timeout_ms.unwrap_or(DEFAULT_KMP_SCAN_TIMEOUT_MS)
    }

    pub fn effective_min_string_len(&self) -> usize {
        self.min_string_len.unwrap_or(DEFAULT_MIN_STRING_LEN).max(1)
    }
}
