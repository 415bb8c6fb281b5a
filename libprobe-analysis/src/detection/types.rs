//! Detection results handed to the report layer.

use std::collections::BTreeSet;

use libprobe_core::{DetectionError, ProbeErrorCode};
use serde::Serialize;

use crate::archive::LibraryEntry;
use crate::flutter::FlutterAnalysisResult;
use crate::frameworks::FrameworkType;

/// Collapse a raw tag set into a valid classification.
///
/// Real frameworks exclude `System` and `Unknown`; `System` excludes
/// `Unknown`; an empty set becomes `{Unknown}`. The result is never empty.
pub fn normalize_frameworks(mut frameworks: BTreeSet<FrameworkType>) -> BTreeSet<FrameworkType> {
    if frameworks.iter().any(FrameworkType::is_framework) {
        frameworks.remove(&FrameworkType::System);
        frameworks.remove(&FrameworkType::Unknown);
    } else if frameworks.contains(&FrameworkType::System) {
        frameworks = BTreeSet::from([FrameworkType::System]);
    } else {
        frameworks = BTreeSet::from([FrameworkType::Unknown]);
    }
    frameworks
}

/// Classification of one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionOutcome {
    pub library: LibraryEntry,
    /// Never empty; `{Unknown}` when nothing matched.
    pub frameworks: BTreeSet<FrameworkType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flutter_analysis: Option<FlutterAnalysisResult>,
    /// Set when the rescue sweep promoted this library from `Unknown`.
    pub rescued: bool,
}

impl DetectionOutcome {
    pub fn new(
        library: LibraryEntry,
        frameworks: BTreeSet<FrameworkType>,
        flutter_analysis: Option<FlutterAnalysisResult>,
    ) -> Self {
        Self {
            library,
            frameworks: normalize_frameworks(frameworks),
            flutter_analysis,
            rescued: false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.frameworks.len() == 1 && self.frameworks.contains(&FrameworkType::Unknown)
    }

    pub fn has(&self, framework: FrameworkType) -> bool {
        self.frameworks.contains(&framework)
    }
}

/// Non-fatal failure recorded for one library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn from_error(path: &str, error: &DetectionError) -> Self {
        Self {
            path: path.to_string(),
            code: error.error_code(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Libraries that passed the ABI filter.
    pub libraries_seen: usize,
    /// Outcomes tagged with anything other than `Unknown`.
    pub libraries_classified: usize,
    /// Libraries skipped entirely (no outcome).
    pub libraries_failed: usize,
    pub libraries_rescued: usize,
    /// Flutter versions resolved from file timestamps rather than the table.
    pub flutter_fallbacks: usize,
    /// Highest aggregate memory checked out during the batch.
    pub peak_memory: u64,
}

/// Aggregate result for one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Every distinct tag across outcomes, excluding `Unknown`.
    pub frameworks: BTreeSet<FrameworkType>,
    pub outcomes: Vec<DetectionOutcome>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn outcome(&self, path: &str) -> Option<&DetectionOutcome> {
        self.outcomes.iter().find(|o| o.library.path == path)
    }

    pub fn diagnostics_for(&self, path: &str) -> impl Iterator<Item = &Diagnostic> {
        let path = path.to_string();
        self.diagnostics.iter().filter(move |d| d.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_never_empty() {
        assert_eq!(
            normalize_frameworks(BTreeSet::new()),
            BTreeSet::from([FrameworkType::Unknown])
        );
    }

    #[test]
    fn test_real_framework_drops_sentinels() {
        let set = BTreeSet::from([
            FrameworkType::Unknown,
            FrameworkType::System,
            FrameworkType::Flutter,
        ]);
        assert_eq!(normalize_frameworks(set), BTreeSet::from([FrameworkType::Flutter]));
    }

    #[test]
    fn test_system_excludes_unknown() {
        let set = BTreeSet::from([FrameworkType::Unknown, FrameworkType::System]);
        assert_eq!(normalize_frameworks(set), BTreeSet::from([FrameworkType::System]));
    }
}
