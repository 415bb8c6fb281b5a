//! Stable error codes surfaced in batch diagnostics.

/// Maps an error to a stable, machine-readable code.
pub trait ProbeErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const SIZE_LIMIT_EXCEEDED: &str = "SIZE_LIMIT_EXCEEDED";
pub const OUT_OF_MEMORY: &str = "OUT_OF_MEMORY";
pub const EVIDENCE_UNAVAILABLE: &str = "EVIDENCE_UNAVAILABLE";
pub const RESOURCE_CLEANUP_FAILURE: &str = "RESOURCE_CLEANUP_FAILURE";
pub const ARCHIVE_ERROR: &str = "ARCHIVE_ERROR";
pub const INVALID_RULE: &str = "INVALID_RULE";
pub const IO_ERROR: &str = "IO_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CONFIG_PARSE_ERROR: &str = "CONFIG_PARSE_ERROR";
