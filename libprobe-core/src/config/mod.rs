//! Engine configuration loaded from `libprobe.toml`.

pub mod probe_config;

pub use probe_config::{ProbeConfig, CONFIG_FILE_NAME};
