//! Flutter engine build-id resolution.
//!
//! A build id is a string that is exactly 40 hex characters (an engine
//! commit hash). Table hits win over discovery order; without any hit the
//! first discovered id is paired with the library's own modification time.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use libprobe_core::FxHashMap;
use serde::Serialize;

/// Where a [`FlutterVersionInfo`] timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// Release date from the version table.
    Table,
    /// Fallback: the library file's modification time. Lower confidence.
    FileTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlutterVersionInfo {
    /// Lowercase 40-character build id.
    pub hex40: String,
    pub last_modified: DateTime<Utc>,
    pub source: VersionSource,
}

impl FlutterVersionInfo {
    pub fn is_fallback(&self) -> bool {
        self.source == VersionSource::FileTimestamp
    }
}

/// Build id → release timestamp, keyed by lowercase hex.
#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    entries: FxHashMap<String, DateTime<Utc>>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ "<hex40>": "<RFC 3339 timestamp>" }`.
    /// Keys that are not 40 hex characters are skipped.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, DateTime<Utc>> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (key, released) in raw {
            if is_build_id(&key) {
                table.insert(&key, released);
            } else {
                tracing::debug!(key = %key, "skipping malformed version table key");
            }
        }
        Ok(table)
    }

    /// Load the table from disk. A missing or unreadable file degrades to an
    /// empty table, so every resolution falls back to file timestamps.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Flutter version table unavailable, only fallback resolution is possible"
                );
                return Self::new();
            }
        };
        match Self::from_json_str(&content) {
            Ok(table) => {
                tracing::info!(path = %path.display(), entries = table.len(), "loaded Flutter version table");
                table
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed Flutter version table, ignoring");
                Self::new()
            }
        }
    }

    pub fn insert(&mut self, hex40: &str, released: DateTime<Utc>) {
        self.entries.insert(hex40.to_ascii_lowercase(), released);
    }

    pub fn get(&self, hex40: &str) -> Option<DateTime<Utc>> {
        self.entries.get(&hex40.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Exactly 40 ASCII hex digits, nothing else.
pub fn is_build_id(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Every build id among `strings`, lowercased, in encounter order.
pub fn find_build_ids<S: AsRef<str>>(strings: &[S]) -> Vec<String> {
    strings
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| is_build_id(s))
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Resolve the engine version from one library's strings.
pub fn resolve_version<S: AsRef<str>>(
    strings: &[S],
    table: &VersionTable,
    file_mtime: DateTime<Utc>,
) -> Option<FlutterVersionInfo> {
    let candidates: Vec<(String, DateTime<Utc>)> = find_build_ids(strings)
        .into_iter()
        .map(|id| (id, file_mtime))
        .collect();
    resolve_candidates(&candidates, table)
}

/// Resolve from candidates that each carry the mtime of the file they came from.
pub(crate) fn resolve_candidates(
    candidates: &[(String, DateTime<Utc>)],
    table: &VersionTable,
) -> Option<FlutterVersionInfo> {
    let (first, first_mtime) = candidates.first()?;

    if let Some((hex40, released)) = candidates
        .iter()
        .find_map(|(id, _)| table.get(id).map(|released| (id, released)))
    {
        return Some(FlutterVersionInfo {
            hex40: hex40.clone(),
            last_modified: released,
            source: VersionSource::Table,
        });
    }

    tracing::warn!(
        build_id = %first,
        mtime = %first_mtime,
        "Flutter build id not in version table, falling back to file timestamp"
    );
    Some(FlutterVersionInfo {
        hex40: first.clone(),
        last_modified: *first_mtime,
        source: VersionSource::FileTimestamp,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const A: &str = "1a65d409c7a1438a34d21b60bf30a6fd5db59314";
    const B: &str = "b8800d88be4866db1b15f8b954ab2573bba9960f";

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_build_id_must_be_whole_string() {
        assert!(is_build_id(A));
        assert!(is_build_id(&A.to_uppercase()));
        assert!(!is_build_id(&format!(" {A}")));
        assert!(!is_build_id(&format!("{A}0")));
        assert!(!is_build_id(&A[..39]));
        assert!(!is_build_id("g".repeat(40).as_str()));
    }

    #[test]
    fn test_no_candidates_yields_none() {
        let table = VersionTable::new();
        assert!(resolve_version(&["libflutter", "not a hash"], &table, ts(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_later_table_hit_beats_earlier_unknown_id() {
        let mut table = VersionTable::new();
        table.insert(B, ts(2023, 5, 10));
        let info = resolve_version(&[A, B], &table, ts(2024, 1, 1)).unwrap();
        assert_eq!(info.hex40, B);
        assert_eq!(info.last_modified, ts(2023, 5, 10));
        assert_eq!(info.source, VersionSource::Table);
    }

    #[test]
    fn test_fallback_uses_first_id_and_mtime() {
        let table = VersionTable::new();
        let info = resolve_version(&[A, B], &table, ts(2024, 1, 1)).unwrap();
        assert_eq!(info.hex40, A);
        assert_eq!(info.last_modified, ts(2024, 1, 1));
        assert!(info.is_fallback());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut table = VersionTable::new();
        table.insert(&A.to_uppercase(), ts(2022, 2, 2));
        let info = resolve_version(&[A.to_uppercase()], &table, ts(2024, 1, 1)).unwrap();
        assert_eq!(info.hex40, A);
        assert_eq!(info.source, VersionSource::Table);
    }

    #[test]
    fn test_json_table_parsing() {
        let json = format!(r#"{{"{A}": "2023-11-15T00:00:00Z", "short": "2020-01-01T00:00:00Z"}}"#);
        let table = VersionTable::from_json_str(&json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(A), Some(Utc.with_ymd_and_hms(2023, 11, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_missing_table_file_degrades_to_empty() {
        let table = VersionTable::load(Path::new("/nonexistent/libprobe/versions.json"));
        assert!(table.is_empty());
    }
}
