//! # libprobe-core
//!
//! Foundation crate for the libprobe detection engine.
//! Defines errors, error codes, configuration, tracing setup, and shared collection types.
//! The analysis crate depends on this.

pub mod config;
pub mod errors;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::ProbeConfig;
pub use errors::error_code::ProbeErrorCode;
pub use errors::{ConfigError, DetectionError};
pub use types::collections::{FxHashMap, FxHashSet};
