//! Selects native libraries under recognized ABI directories.

use super::{EntryDescriptor, LibraryEntry};

/// Keeps only entries whose path starts with one of the configured ABI prefixes.
///
/// Pure and order-preserving: filtering the output again returns it unchanged.
#[derive(Debug, Clone)]
pub struct ArchiveEntryFilter {
    abi_dirs: Vec<String>,
}

impl ArchiveEntryFilter {
    /// Prefixes are matched literally; a trailing `/` is added when missing.
    pub fn new<I, S>(abi_dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let abi_dirs = abi_dirs
            .into_iter()
            .map(Into::into)
            .filter(|d: &String| !d.is_empty())
            .map(|d| if d.ends_with('/') { d } else { format!("{d}/") })
            .collect();
        Self { abi_dirs }
    }

    pub fn abi_dirs(&self) -> &[String] {
        &self.abi_dirs
    }

    pub fn filter(&self, entries: &[EntryDescriptor]) -> Vec<LibraryEntry> {
        entries.iter().filter_map(|e| self.select(e)).collect()
    }

    fn select(&self, entry: &EntryDescriptor) -> Option<LibraryEntry> {
        if entry.is_dir || entry.path.ends_with('/') {
            return None;
        }
        let prefix = self
            .abi_dirs
            .iter()
            .find(|prefix| entry.path.starts_with(prefix.as_str()))?;
        let file_name = entry.path.rsplit('/').next().unwrap_or_default();
        if file_name.is_empty() {
            return None;
        }
        let architecture_dir = prefix
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Some(LibraryEntry {
            path: entry.path.clone(),
            file_name: file_name.to_string(),
            architecture_dir,
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            last_modified: entry.last_modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> EntryDescriptor {
        EntryDescriptor {
            path: path.to_string(),
            compressed_size: 10,
            uncompressed_size: Some(20),
            last_modified: None,
            is_dir: path.ends_with('/'),
        }
    }

    #[test]
    fn test_keeps_only_64_bit_abi_entries_in_order() {
        let filter = ArchiveEntryFilter::new(["lib/arm64-v8a/", "lib/x86_64"]);
        let entries = vec![
            entry("lib/x86_64/libb.so"),
            entry("lib/armeabi-v7a/liba.so"),
            entry("lib/arm64-v8a/liba.so"),
            entry("assets/flutter_assets/AssetManifest.json"),
            entry("lib/arm64-v8a/"),
        ];
        let libs = filter.filter(&entries);
        let paths: Vec<&str> = libs.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(paths, vec!["lib/x86_64/libb.so", "lib/arm64-v8a/liba.so"]);
        assert_eq!(libs[0].architecture_dir, "x86_64");
        assert_eq!(libs[1].architecture_dir, "arm64-v8a");
        assert_eq!(libs[1].file_name, "liba.so");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let filter = ArchiveEntryFilter::new(["lib/arm64-v8a/"]);
        let entries = vec![entry("lib/arm64-v8a/libapp.so"), entry("lib/x86/libapp.so")];
        let once = filter.filter(&entries);
        let again: Vec<EntryDescriptor> = once
            .iter()
            .map(|l| EntryDescriptor {
                path: l.path.clone(),
                compressed_size: l.compressed_size,
                uncompressed_size: l.uncompressed_size,
                last_modified: l.last_modified,
                is_dir: false,
            })
            .collect();
        assert_eq!(filter.filter(&again), once);
    }

    #[test]
    fn test_declared_size_never_below_compressed() {
        let filter = ArchiveEntryFilter::new(["lib/arm64-v8a/"]);
        let mut e = entry("lib/arm64-v8a/libx.so");
        e.compressed_size = 50;
        e.uncompressed_size = None;
        let libs = filter.filter(&[e]);
        assert_eq!(libs[0].declared_size(), 50);
    }
}
