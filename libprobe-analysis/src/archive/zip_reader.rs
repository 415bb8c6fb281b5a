//! ZIP-backed [`ArchiveReader`] (APK, AAB, and IPA containers are ZIP files).

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use libprobe_core::errors::DetectionResult;
use libprobe_core::DetectionError;
use zip::ZipArchive;

use super::{ArchiveReader, EntryDescriptor};

pub struct ZipArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    entries: Vec<EntryDescriptor>,
}

impl ZipArchiveReader<BufReader<File>> {
    /// Open a ZIP file on disk.
    pub fn open(path: &Path) -> DetectionResult<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipArchiveReader<R> {
    /// Read the central directory and snapshot every entry's metadata.
    pub fn new(reader: R) -> DetectionResult<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| DetectionError::archive(format!("failed to read ZIP archive: {e}")))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index).map_err(|e| {
                DetectionError::archive(format!("failed to read ZIP entry #{index}: {e}"))
            })?;
            entries.push(EntryDescriptor {
                path: file.name().to_string(),
                compressed_size: file.compressed_size(),
                uncompressed_size: Some(file.size()),
                last_modified: zip_time_to_utc(file.last_modified()),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { archive, entries })
    }
}

impl<R: Read + Seek> ArchiveReader for ZipArchiveReader<R> {
    fn entries(&self) -> Vec<EntryDescriptor> {
        self.entries.clone()
    }

    fn open_entry(&mut self, path: &str) -> DetectionResult<Box<dyn Read + '_>> {
        let file = self
            .archive
            .by_name(path)
            .map_err(|e| DetectionError::archive(format!("failed to open {path}: {e}")))?;
        Ok(Box::new(file))
    }
}

/// ZIP timestamps are local time without a zone; they are taken as UTC.
fn zip_time_to_utc(time: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(
        i32::from(time.year()),
        u32::from(time.month()),
        u32::from(time.day()),
    )?
    .and_hms_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
    )
    .map(|naive| naive.and_utc())
}
