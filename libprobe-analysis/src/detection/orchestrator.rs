//! Drives detection for one archive.
//!
//! Libraries are processed one at a time in archive enumeration order. Per-library
//! errors become diagnostics; only memory exhaustion aborts the batch.

use std::collections::BTreeSet;
use std::time::Instant;

use libprobe_core::{DetectionError, FxHashSet, ProbeConfig};

use crate::archive::{
    ArchiveEntryFilter, ArchiveReader, BoundedExtractor, LibraryEntry, MemoryLedger,
};
use crate::evidence::{BinaryEvidenceSource, ElfEvidenceSource};
use crate::flutter::{FlutterAnalysisResult, FlutterEvidence, FlutterSubAnalyzer};
use crate::frameworks::{FrameworkPatternMatcher, FrameworkType, RulePackRegistry};
use crate::verifiers::KmpVerifier;

use super::scratch::ScratchFile;
use super::state::{LibraryState, PrimarySweep};
use super::types::{BatchReport, BatchSummary, DetectionOutcome, Diagnostic};

const FLUTTER_ENGINE: &str = "libflutter.so";

/// Mutable state shared by every library of one batch.
struct BatchContext<'r, 'l> {
    reader: &'r mut dyn ArchiveReader,
    ledger: &'l MemoryLedger,
    libraries: Vec<LibraryEntry>,
    /// Paths rejected by the size check; never read again in this batch.
    skipped: FxHashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl BatchContext<'_, '_> {
    /// Record a per-library failure. Fatal errors are handed back to abort the batch.
    fn record(&mut self, path: &str, error: DetectionError) -> Result<(), DetectionError> {
        if error.is_fatal() {
            tracing::error!(path = %path, error = %error, "aborting batch");
            return Err(error);
        }
        tracing::warn!(path = %path, error = %error, "library analysis failed");
        self.diagnostics.push(Diagnostic::from_error(path, &error));
        Ok(())
    }

    /// The `libflutter.so` sharing `entry`'s ABI directory, if it is a different
    /// file that passed the size check.
    fn engine_for(&self, entry: &LibraryEntry) -> Option<LibraryEntry> {
        self.libraries
            .iter()
            .find(|l| {
                l.file_name == FLUTTER_ENGINE
                    && l.architecture_dir == entry.architecture_dir
                    && l.path != entry.path
                    && !self.skipped.contains(&l.path)
            })
            .cloned()
    }
}

/// Classifies every native library of an archive.
///
/// Holds only configuration and static tables; each batch gets its own
/// [`MemoryLedger`].
pub struct DetectionOrchestrator {
    filter: ArchiveEntryFilter,
    extractor: BoundedExtractor,
    matcher: FrameworkPatternMatcher,
    kmp: KmpVerifier,
    flutter: FlutterSubAnalyzer,
    evidence: Box<dyn BinaryEvidenceSource>,
}

impl DetectionOrchestrator {
    pub fn new(
        filter: ArchiveEntryFilter,
        extractor: BoundedExtractor,
        matcher: FrameworkPatternMatcher,
        kmp: KmpVerifier,
        flutter: FlutterSubAnalyzer,
        evidence: Box<dyn BinaryEvidenceSource>,
    ) -> Self {
        Self {
            filter,
            extractor,
            matcher,
            kmp,
            flutter,
            evidence,
        }
    }

    /// Build every component from configuration, with the ELF evidence source.
    pub fn from_config(config: &ProbeConfig) -> Result<Self, DetectionError> {
        Ok(Self::new(
            ArchiveEntryFilter::new(config.effective_abi_dirs()),
            BoundedExtractor::from_config(config),
            RulePackRegistry::from_config(config).into_matcher(),
            KmpVerifier::from_config(config)?,
            FlutterSubAnalyzer::from_config(config),
            Box::new(ElfEvidenceSource::new(config.effective_min_string_len())),
        ))
    }

    /// Replace the evidence source.
    pub fn with_evidence_source(mut self, evidence: Box<dyn BinaryEvidenceSource>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn matcher(&self) -> &FrameworkPatternMatcher {
        &self.matcher
    }

    pub fn extractor(&self) -> &BoundedExtractor {
        &self.extractor
    }

    /// Analyze an archive with a fresh ledger sized from the extractor's budget.
    pub fn analyze(&self, reader: &mut dyn ArchiveReader) -> Result<BatchReport, DetectionError> {
        let ledger = MemoryLedger::for_budget(self.extractor.budget());
        self.analyze_with_ledger(reader, &ledger)
    }

    /// Analyze an archive against a caller-supplied ledger.
    ///
    /// Returns `Err` only for memory exhaustion; every other failure is
    /// reported in [`BatchReport::diagnostics`].
    pub fn analyze_with_ledger(
        &self,
        reader: &mut dyn ArchiveReader,
        ledger: &MemoryLedger,
    ) -> Result<BatchReport, DetectionError> {
        let started = Instant::now();
        let libraries = self.filter.filter(&reader.entries());
        tracing::info!(libraries = libraries.len(), "starting detection batch");

        let mut ctx = BatchContext {
            reader,
            ledger,
            libraries,
            skipped: FxHashSet::default(),
            diagnostics: Vec::new(),
        };

        let sweep = self.primary_sweep(&mut ctx)?;
        let failed = sweep.failed();
        let outcomes = self.rescue_sweep(&mut ctx, sweep)?;
        let report = build_report(
            outcomes,
            ctx.diagnostics,
            ctx.libraries.len(),
            failed,
            ledger.peak(),
        );
        tracing::info!(
            libraries = report.summary.libraries_seen,
            classified = report.summary.libraries_classified,
            failed = report.summary.libraries_failed,
            rescued = report.summary.libraries_rescued,
            frameworks = ?report.frameworks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "detection batch complete"
        );
        Ok(report)
    }

    /// Classify every filtered library by file name and escalation.
    fn primary_sweep(
        &self,
        ctx: &mut BatchContext<'_, '_>,
    ) -> Result<PrimarySweep, DetectionError> {
        let mut outcomes = Vec::with_capacity(ctx.libraries.len());
        let mut failed = 0;
        for entry in ctx.libraries.clone() {
            match self.classify(ctx, entry)? {
                Some(outcome) => outcomes.push(outcome),
                None => failed += 1,
            }
        }
        Ok(PrimarySweep::new(outcomes, failed))
    }

    /// Walk one library through the state machine. `None` means it was skipped.
    fn classify(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        entry: LibraryEntry,
    ) -> Result<Option<DetectionOutcome>, DetectionError> {
        let mut state = LibraryState::Filtered(entry);
        loop {
            tracing::trace!(path = %state.entry().path, state = state.name(), "library state");
            state = match state {
                LibraryState::Filtered(entry) => {
                    if let Err(e) = self.extractor.check_size(&entry, ctx.ledger) {
                        ctx.record(&entry.path, e)?;
                        ctx.skipped.insert(entry.path);
                        return Ok(None);
                    }
                    let candidates = self.matcher.match_name(&entry.file_name);
                    LibraryState::PatternMatched { entry, candidates }
                }
                LibraryState::PatternMatched {
                    entry,
                    mut candidates,
                } => {
                    if !candidates.contains(&FrameworkType::KotlinMultiplatform) {
                        LibraryState::Verified {
                            entry,
                            frameworks: candidates,
                        }
                    } else {
                        match self.verify_kmp(ctx, &entry) {
                            Ok(true) => LibraryState::Verified {
                                entry,
                                frameworks: candidates,
                            },
                            Ok(false) => {
                                candidates.remove(&FrameworkType::KotlinMultiplatform);
                                LibraryState::Verified {
                                    entry,
                                    frameworks: candidates,
                                }
                            }
                            Err(e) => {
                                ctx.record(&entry.path, e)?;
                                LibraryState::Unverified {
                                    entry,
                                    frameworks: candidates,
                                }
                            }
                        }
                    }
                }
                LibraryState::Verified { entry, frameworks } => {
                    let flutter_analysis = if frameworks.contains(&FrameworkType::Flutter) {
                        self.try_flutter_analysis(ctx, &entry)?
                    } else {
                        None
                    };
                    LibraryState::Final(DetectionOutcome::new(entry, frameworks, flutter_analysis))
                }
                LibraryState::Unverified { entry, frameworks } => {
                    LibraryState::Final(DetectionOutcome::new(entry, frameworks, None))
                }
                LibraryState::Final(outcome) => {
                    tracing::debug!(
                        path = %outcome.library.path,
                        frameworks = ?outcome.frameworks,
                        "classified library"
                    );
                    return Ok(Some(outcome));
                }
            };
        }
    }

    /// Second pass over a finished primary sweep. Only `Unknown` outcomes are touched.
    fn rescue_sweep(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        sweep: PrimarySweep,
    ) -> Result<Vec<DetectionOutcome>, DetectionError> {
        let (outcomes, _) = sweep.into_parts();
        let candidates = outcomes.iter().filter(|o| o.is_unknown()).count();
        if candidates > 0 {
            tracing::debug!(candidates, "starting rescue sweep");
        }
        outcomes
            .into_iter()
            .map(|outcome| self.rescue(ctx, outcome))
            .collect()
    }

    /// Re-test a library left `Unknown` directly against the Flutter and KMP detectors.
    fn rescue(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        outcome: DetectionOutcome,
    ) -> Result<DetectionOutcome, DetectionError> {
        if !outcome.is_unknown() {
            return Ok(outcome);
        }
        let entry = &outcome.library;

        // Promotion is decided on the library's own strings; the engine only
        // contributes to the deep analysis once the library is known to be Flutter.
        match self.flutter_evidence(ctx, entry) {
            Ok(own) => {
                if self.flutter.analyze(std::slice::from_ref(&own)).is_flutter {
                    let sources = self.with_engine_evidence(ctx, entry, own)?;
                    let analysis = self.flutter.analyze(&sources);
                    tracing::info!(path = %entry.path, "rescue sweep: promoted to flutter");
                    return Ok(promote(outcome, FrameworkType::Flutter, Some(analysis)));
                }
            }
            Err(e) => ctx.record(&entry.path, e)?,
        }

        match self.verify_kmp(ctx, entry) {
            Ok(true) => {
                tracing::info!(path = %entry.path, "rescue sweep: promoted to kotlin-multiplatform");
                Ok(promote(outcome, FrameworkType::KotlinMultiplatform, None))
            }
            Ok(false) => Ok(outcome),
            Err(e) => {
                ctx.record(&entry.path, e)?;
                Ok(outcome)
            }
        }
    }

    fn verify_kmp(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        entry: &LibraryEntry,
    ) -> Result<bool, DetectionError> {
        let extracted = self.extractor.extract(&mut *ctx.reader, entry, ctx.ledger)?;
        let scratch = ScratchFile::write(extracted.bytes())?;
        let symbols = self.evidence.symbols(scratch.path())?;
        let verdict = self.kmp.verdict(&symbols, extracted.bytes());
        tracing::debug!(path = %entry.path, verdict = ?verdict, "KMP verification");
        Ok(verdict.is_kmp())
    }

    /// Flutter analysis for a library already tagged Flutter. Non-fatal
    /// failures are recorded and yield `None`.
    fn try_flutter_analysis(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        entry: &LibraryEntry,
    ) -> Result<Option<FlutterAnalysisResult>, DetectionError> {
        match self.flutter_analysis(ctx, entry) {
            Ok(analysis) => Ok(Some(analysis)),
            Err(e) => {
                ctx.record(&entry.path, e)?;
                Ok(None)
            }
        }
    }

    /// Analyze the library and, when present, the co-located engine.
    fn flutter_analysis(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        entry: &LibraryEntry,
    ) -> Result<FlutterAnalysisResult, DetectionError> {
        let own = self.flutter_evidence(ctx, entry)?;
        let sources = self.with_engine_evidence(ctx, entry, own)?;
        let analysis = self.flutter.analyze(&sources);
        tracing::debug!(
            path = %entry.path,
            is_flutter = analysis.is_flutter,
            packages = analysis.dart_packages.len(),
            version = ?analysis.flutter_version.as_ref().map(|v| v.hex40.as_str()),
            "Flutter analysis"
        );
        Ok(analysis)
    }

    /// `own` followed by the co-located engine's evidence. An engine that cannot
    /// be read is recorded under its own path and left out.
    fn with_engine_evidence(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        entry: &LibraryEntry,
        own: FlutterEvidence,
    ) -> Result<Vec<FlutterEvidence>, DetectionError> {
        let mut sources = vec![own];
        if let Some(engine) = ctx.engine_for(entry) {
            match self.flutter_evidence(ctx, &engine) {
                Ok(evidence) => sources.push(evidence),
                Err(e) => {
                    tracing::debug!(
                        path = %entry.path,
                        engine = %engine.path,
                        "analyzing without engine evidence"
                    );
                    ctx.record(&engine.path, e)?;
                }
            }
        }
        Ok(sources)
    }

    fn flutter_evidence(
        &self,
        ctx: &mut BatchContext<'_, '_>,
        entry: &LibraryEntry,
    ) -> Result<FlutterEvidence, DetectionError> {
        let extracted = self.extractor.extract(&mut *ctx.reader, entry, ctx.ledger)?;
        let scratch = ScratchFile::write(extracted.bytes())?;
        let strings = self.evidence.strings(scratch.path())?;
        let modified = match entry.last_modified {
            Some(at) => at,
            None => scratch.modified()?,
        };
        Ok(FlutterEvidence { strings, modified })
    }
}

fn promote(
    outcome: DetectionOutcome,
    framework: FrameworkType,
    flutter_analysis: Option<FlutterAnalysisResult>,
) -> DetectionOutcome {
    let mut promoted =
        DetectionOutcome::new(outcome.library, BTreeSet::from([framework]), flutter_analysis);
    promoted.rescued = true;
    promoted
}

fn build_report(
    outcomes: Vec<DetectionOutcome>,
    diagnostics: Vec<Diagnostic>,
    libraries_seen: usize,
    libraries_failed: usize,
    peak_memory: u64,
) -> BatchReport {
    let frameworks: BTreeSet<FrameworkType> = outcomes
        .iter()
        .flat_map(|o| o.frameworks.iter().copied())
        .filter(|f| *f != FrameworkType::Unknown)
        .collect();
    let flutter_fallbacks = outcomes
        .iter()
        .filter_map(|o| o.flutter_analysis.as_ref()?.flutter_version.as_ref())
        .filter(|v| v.is_fallback())
        .count();
    let summary = BatchSummary {
        libraries_seen,
        libraries_classified: outcomes.iter().filter(|o| !o.is_unknown()).count(),
        libraries_failed,
        libraries_rescued: outcomes.iter().filter(|o| o.rescued).count(),
        flutter_fallbacks,
        peak_memory,
    };
    BatchReport {
        frameworks,
        outcomes,
        diagnostics,
        summary,
    }
}
