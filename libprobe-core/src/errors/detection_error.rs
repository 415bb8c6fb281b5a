//! Errors raised while classifying native libraries.

use super::error_code::{self, ProbeErrorCode};

/// Errors that can occur while extracting or classifying a library.
///
/// Only [`DetectionError::OutOfMemory`] is fatal to a batch; everything else is
/// recorded as a per-library diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("{path}: size {size} exceeds per-file limit of {limit} bytes")]
    SizeLimitExceeded { path: String, size: u64, limit: u64 },

    #[error(
        "{path}: checking out {requested} bytes exceeds the aggregate memory budget \
         ({outstanding} of {limit} bytes in use)"
    )]
    OutOfMemory {
        path: String,
        requested: u64,
        outstanding: u64,
        limit: u64,
    },

    #[error("{path}: binary evidence unavailable: {message}")]
    EvidenceUnavailable { path: String, message: String },

    #[error("failed to clean up {path}: {message}")]
    ResourceCleanupFailure { path: String, message: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectionError {
    /// Memory exhaustion aborts the whole batch; every other error is scoped to one library.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    pub fn evidence(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EvidenceUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }
}

impl ProbeErrorCode for DetectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SizeLimitExceeded { .. } => error_code::SIZE_LIMIT_EXCEEDED,
            Self::OutOfMemory { .. } => error_code::OUT_OF_MEMORY,
            Self::EvidenceUnavailable { .. } => error_code::EVIDENCE_UNAVAILABLE,
            Self::ResourceCleanupFailure { .. } => error_code::RESOURCE_CLEANUP_FAILURE,
            Self::Archive { .. } => error_code::ARCHIVE_ERROR,
            Self::InvalidRule(_) => error_code::INVALID_RULE,
            Self::Io(_) => error_code::IO_ERROR,
        }
    }
}

pub type DetectionResult<T> = Result<T, DetectionError>;
