//! # libprobe-analysis
//!
//! Classifies native shared libraries pulled from application packages by the
//! runtime framework that produced them.
//!
//! Pipeline per archive:
//! ABI filter → size/memory check → file-name rules → KMP verification →
//! Flutter sub-analysis → rescue sweep over libraries left unknown.

pub mod archive;
pub mod detection;
pub mod evidence;
pub mod flutter;
pub mod frameworks;
pub mod verifiers;

pub use detection::{BatchReport, DetectionOrchestrator, DetectionOutcome};
pub use frameworks::FrameworkType;
