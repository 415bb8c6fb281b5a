//! In-memory archive for hosts that already hold decoded entries.

use std::io::{Cursor, Read};

use chrono::{DateTime, Utc};
use libprobe_core::errors::DetectionResult;
use libprobe_core::DetectionError;

use super::{ArchiveReader, EntryDescriptor};

#[derive(Debug, Clone)]
struct MemoryEntry {
    descriptor: EntryDescriptor,
    data: Vec<u8>,
}

/// An archive whose entries live in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: Vec<MemoryEntry>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry whose compressed and uncompressed sizes equal its length.
    pub fn with_entry(self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let len = data.len() as u64;
        self.with_entry_sizes(path, data, len, Some(len))
    }

    /// Add an entry with explicit size metadata, as a container would declare it.
    pub fn with_entry_sizes(
        mut self,
        path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        compressed_size: u64,
        uncompressed_size: Option<u64>,
    ) -> Self {
        let path = path.into();
        self.entries.push(MemoryEntry {
            descriptor: EntryDescriptor {
                is_dir: path.ends_with('/'),
                path,
                compressed_size,
                uncompressed_size,
                last_modified: None,
            },
            data: data.into(),
        });
        self
    }

    /// Set the last-modified time of the most recently added entry.
    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        if let Some(last) = self.entries.last_mut() {
            last.descriptor.last_modified = Some(at);
        }
        self
    }
}

impl ArchiveReader for MemoryArchive {
    fn entries(&self) -> Vec<EntryDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    fn open_entry(&mut self, path: &str) -> DetectionResult<Box<dyn Read + '_>> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor.path == path)
            .ok_or_else(|| DetectionError::archive(format!("no entry named {path}")))?;
        Ok(Box::new(Cursor::new(entry.data.as_slice())))
    }
}
