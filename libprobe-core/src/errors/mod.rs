//! Error types for every libprobe subsystem.

pub mod config_error;
pub mod detection_error;
pub mod error_code;

pub use config_error::ConfigError;
pub use detection_error::{DetectionError, DetectionResult};
