//! Per-library classification states.
//!
//! `Filtered → PatternMatched → {Verified | Unverified} → Final`. Flutter
//! sub-analysis happens on the `Verified → Final` edge. The rescue sweep only
//! accepts a [`PrimarySweep`], which is produced once every filtered library
//! has been through the primary pass.

use std::collections::BTreeSet;

use crate::archive::LibraryEntry;
use crate::frameworks::FrameworkType;

use super::types::DetectionOutcome;

#[derive(Debug, Clone)]
pub enum LibraryState {
    /// Passed the ABI filter; size not yet checked.
    Filtered(LibraryEntry),
    /// File-name rules applied. Empty `candidates` means nothing matched.
    PatternMatched {
        entry: LibraryEntry,
        candidates: BTreeSet<FrameworkType>,
    },
    /// Escalation finished; rejected candidates removed.
    Verified {
        entry: LibraryEntry,
        frameworks: BTreeSet<FrameworkType>,
    },
    /// Evidence was unavailable, so escalation was skipped and the
    /// file-name result stands as-is.
    Unverified {
        entry: LibraryEntry,
        frameworks: BTreeSet<FrameworkType>,
    },
    Final(DetectionOutcome),
}

impl LibraryState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Filtered(_) => "filtered",
            Self::PatternMatched { .. } => "pattern_matched",
            Self::Verified { .. } => "verified",
            Self::Unverified { .. } => "unverified",
            Self::Final(_) => "final",
        }
    }

    pub fn entry(&self) -> &LibraryEntry {
        match self {
            Self::Filtered(entry)
            | Self::PatternMatched { entry, .. }
            | Self::Verified { entry, .. }
            | Self::Unverified { entry, .. } => entry,
            Self::Final(outcome) => &outcome.library,
        }
    }
}

/// Outcomes of a completed primary sweep, in archive enumeration order.
#[derive(Debug)]
pub struct PrimarySweep {
    outcomes: Vec<DetectionOutcome>,
    failed: usize,
}

impl PrimarySweep {
    pub(crate) fn new(outcomes: Vec<DetectionOutcome>, failed: usize) -> Self {
        Self { outcomes, failed }
    }

    pub fn outcomes(&self) -> &[DetectionOutcome] {
        &self.outcomes
    }

    /// Libraries that produced no outcome.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub(crate) fn into_parts(self) -> (Vec<DetectionOutcome>, usize) {
        (self.outcomes, self.failed)
    }
}
