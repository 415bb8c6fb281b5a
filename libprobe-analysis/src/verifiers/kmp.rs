//! Kotlin-Multiplatform confirmation from symbol and raw-byte evidence.
//!
//! Symbol names are checked first and short-circuit the byte scan. The byte
//! scan is ASCII case-insensitive, runs over fixed-size chunks, and stops once
//! the threshold is met or the scan deadline passes.

use std::time::{Duration, Instant};

use aho_corasick::AhoCorasick;
use libprobe_core::{DetectionError, ProbeConfig};

use crate::evidence::SymbolTable;

/// Kotlin/Native runtime markers: mangled function, class and type prefixes
/// plus runtime entry points.
pub const DEFAULT_KMP_MARKERS: &[&str] = &[
    "kfun:",
    "kclass:",
    "ktype:",
    "Kotlin_",
    "konan::",
    "kotlin.native",
];

const SCAN_CHUNK: usize = 4 * 1024 * 1024;

/// Why the verifier decided what it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KmpVerdict {
    /// A symbol name contained a marker.
    Symbol(String),
    /// The byte scan counted at least `threshold` marker occurrences.
    Bytes { occurrences: usize },
    /// Neither source met its bar.
    NotKmp { occurrences: usize, timed_out: bool },
}

impl KmpVerdict {
    pub fn is_kmp(&self) -> bool {
        !matches!(self, Self::NotKmp { .. })
    }
}

#[derive(Debug, Clone)]
pub struct KmpVerifier {
    symbol_matcher: AhoCorasick,
    byte_matcher: AhoCorasick,
    longest_marker: usize,
    threshold: usize,
    scan_timeout: Duration,
}

impl KmpVerifier {
    pub fn new(threshold: usize, scan_timeout: Duration) -> Result<Self, DetectionError> {
        Self::with_markers(DEFAULT_KMP_MARKERS, threshold, scan_timeout)
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self, DetectionError> {
        Self::new(
            config.effective_kmp_marker_threshold(),
            Duration::from_millis(config.effective_kmp_scan_timeout_ms()),
        )
    }

    pub fn with_markers<S: AsRef<str>>(
        markers: &[S],
        threshold: usize,
        scan_timeout: Duration,
    ) -> Result<Self, DetectionError> {
        let markers: Vec<&str> = markers
            .iter()
            .map(AsRef::as_ref)
            .filter(|m| !m.is_empty())
            .collect();
        if markers.is_empty() {
            return Err(DetectionError::InvalidRule("KMP marker list is empty".into()));
        }
        let symbol_matcher = AhoCorasick::new(&markers)
            .map_err(|e| DetectionError::InvalidRule(format!("KMP markers: {e}")))?;
        let byte_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&markers)
            .map_err(|e| DetectionError::InvalidRule(format!("KMP markers: {e}")))?;
        let longest_marker = markers.iter().map(|m| m.len()).max().unwrap_or(1);

        Ok(Self {
            symbol_matcher,
            byte_matcher,
            longest_marker,
            threshold: threshold.max(1),
            scan_timeout,
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn verify(&self, symbols: &SymbolTable, bytes: &[u8]) -> bool {
        self.verdict(symbols, bytes).is_kmp()
    }

    pub fn verdict(&self, symbols: &SymbolTable, bytes: &[u8]) -> KmpVerdict {
        if let Some(name) = self.symbol_evidence(symbols) {
            return KmpVerdict::Symbol(name.to_string());
        }
        let (occurrences, timed_out) = self.count_byte_markers(bytes);
        if occurrences >= self.threshold {
            KmpVerdict::Bytes { occurrences }
        } else {
            KmpVerdict::NotKmp {
                occurrences,
                timed_out,
            }
        }
    }

    /// First exported or imported symbol containing a marker.
    pub fn symbol_evidence<'s>(&self, symbols: &'s SymbolTable) -> Option<&'s str> {
        symbols.names().find(|name| self.symbol_matcher.is_match(name))
    }

    /// Count marker occurrences in `bytes`, stopping at the threshold or the deadline.
    /// Returns the count and whether the deadline cut the scan short.
    pub fn count_byte_markers(&self, bytes: &[u8]) -> (usize, bool) {
        let started = Instant::now();
        let overlap = self.longest_marker.saturating_sub(1);
        let mut count = 0;
        let mut chunk_start = 0;

        while chunk_start < bytes.len() {
            let chunk_end = (chunk_start + SCAN_CHUNK).min(bytes.len());
            let window_end = (chunk_end + overlap).min(bytes.len());
            // Matches starting in the overlap belong to the next chunk.
            count += self
                .byte_matcher
                .find_iter(&bytes[chunk_start..window_end])
                .filter(|m| chunk_start + m.start() < chunk_end)
                .count();

            if count >= self.threshold {
                return (count, false);
            }
            chunk_start = chunk_end;
            if chunk_start < bytes.len() && started.elapsed() > self.scan_timeout {
                tracing::warn!(
                    scanned = chunk_start,
                    total = bytes.len(),
                    timeout_ms = self.scan_timeout.as_millis() as u64,
                    "KMP byte scan deadline reached"
                );
                return (count, true);
            }
        }
        (count, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(threshold: usize) -> KmpVerifier {
        KmpVerifier::new(threshold, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_symbol_marker_short_circuits() {
        let symbols = SymbolTable::new(vec!["kfun:SomeClass.method".into()], vec![]);
        let v = verifier(3);
        assert_eq!(
            v.verdict(&symbols, b"no markers in here"),
            KmpVerdict::Symbol("kfun:SomeClass.method".into())
        );
    }

    #[test]
    fn test_imports_count_as_symbol_evidence() {
        let symbols = SymbolTable::new(vec!["JNI_OnLoad".into()], vec!["Kotlin_initRuntimeIfNeeded".into()]);
        assert!(verifier(1).verify(&symbols, &[]));
    }

    #[test]
    fn test_byte_scan_is_case_insensitive() {
        let bytes = b"\x00\x00KOTLIN.NATIVE.internal\x00";
        assert_eq!(verifier(1).count_byte_markers(bytes), (1, false));
        assert!(verifier(1).verify(&SymbolTable::default(), bytes));
    }

    #[test]
    fn test_threshold_is_honored() {
        let bytes = b"kfun:a\x00kclass:b\x00";
        let v = verifier(3);
        assert_eq!(
            v.verdict(&SymbolTable::default(), bytes),
            KmpVerdict::NotKmp {
                occurrences: 2,
                timed_out: false
            }
        );
        assert!(verifier(2).verify(&SymbolTable::default(), bytes));
    }

    #[test]
    fn test_no_evidence_is_not_kmp() {
        let symbols = SymbolTable::new(vec!["Java_com_example_Native_init".into()], vec!["malloc".into()]);
        assert!(!verifier(1).verify(&symbols, b"libshared.so plain C library"));
    }

    #[test]
    fn test_match_across_chunk_boundary_counted_once() {
        let mut bytes = vec![b'x'; SCAN_CHUNK - 2];
        bytes.extend_from_slice(b"kfun:boundary");
        bytes.extend(std::iter::repeat(b'y').take(16));
        let v = verifier(10);
        assert_eq!(v.count_byte_markers(&bytes), (1, false));
    }

    #[test]
    fn test_scan_deadline_stops_after_first_chunk() {
        let mut bytes = vec![b'x'; SCAN_CHUNK + 64];
        bytes.extend_from_slice(b"kfun:late");
        let v = KmpVerifier::new(5, Duration::ZERO).unwrap();
        assert_eq!(v.count_byte_markers(&bytes), (0, true));
        assert_eq!(
            v.verdict(&SymbolTable::default(), &bytes),
            KmpVerdict::NotKmp {
                occurrences: 0,
                timed_out: true
            }
        );
    }

    #[test]
    fn test_empty_marker_list_rejected() {
        let empty: [&str; 0] = [];
        assert!(KmpVerifier::with_markers(&empty, 1, Duration::from_secs(1)).is_err());
    }
}
