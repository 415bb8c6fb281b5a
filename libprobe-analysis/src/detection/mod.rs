//! Per-archive detection: primary sweep, escalation, and rescue sweep.

pub mod orchestrator;
pub mod scratch;
pub mod state;
pub mod types;

pub use orchestrator::DetectionOrchestrator;
pub use scratch::ScratchFile;
pub use state::{LibraryState, PrimarySweep};
pub use types::{normalize_frameworks, BatchReport, BatchSummary, DetectionOutcome, Diagnostic};
