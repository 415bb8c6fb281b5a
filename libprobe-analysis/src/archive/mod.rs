//! Archive access: entry descriptors, ABI filtering, and bounded extraction.
//!
//! The engine never depends on a concrete container format. Anything that can
//! enumerate entries and stream one entry's bytes implements [`ArchiveReader`].

pub mod budget;
pub mod extractor;
pub mod filter;
pub mod memory;
pub mod zip_reader;

use std::io::Read;

use chrono::{DateTime, Utc};
use libprobe_core::errors::DetectionResult;
use serde::Serialize;

pub use budget::{MemoryLedger, Reservation, SizeBudget};
pub use extractor::{BoundedExtractor, ExtractedBytes};
pub use filter::ArchiveEntryFilter;
pub use memory::MemoryArchive;
pub use zip_reader::ZipArchiveReader;

/// One entry as enumerated from the archive's central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub path: String,
    pub compressed_size: u64,
    /// Known only when the container records it ahead of decompression.
    pub uncompressed_size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

/// A native library selected for analysis. Identity is the archive path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LibraryEntry {
    pub path: String,
    pub file_name: String,
    /// ABI directory name, e.g. `arm64-v8a`.
    pub architecture_dir: String,
    pub compressed_size: u64,
    pub uncompressed_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl LibraryEntry {
    /// Size used for limit checks: the declared uncompressed size when known,
    /// never less than the compressed size.
    pub fn declared_size(&self) -> u64 {
        self.uncompressed_size
            .unwrap_or(self.compressed_size)
            .max(self.compressed_size)
    }
}

/// Read access to an archive's entries.
pub trait ArchiveReader {
    /// All entries, in archive enumeration order.
    fn entries(&self) -> Vec<EntryDescriptor>;

    /// Stream the decompressed bytes of the entry at `path`.
    fn open_entry(&mut self, path: &str) -> DetectionResult<Box<dyn Read + '_>>;
}
