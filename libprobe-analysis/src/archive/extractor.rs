//! Bounded materialization of archive entries into memory.
//!
//! Accounting is two-phase: the compressed size is checked out before any
//! decompression happens, the stream is read with a hard cap of
//! `max_file_size + 1` bytes, and the reservation is then re-sized to the
//! length actually read. A tiny entry can therefore never inflate into an
//! unbounded allocation.

use std::io::Read;

use libprobe_core::{DetectionError, ProbeConfig};

use super::budget::{MemoryLedger, Reservation, SizeBudget};
use super::{ArchiveReader, LibraryEntry};

/// Entry bytes together with the ledger checkout that pays for them.
///
/// The checkout is released when this value is dropped.
#[derive(Debug)]
pub struct ExtractedBytes<'l> {
    bytes: Vec<u8>,
    reservation: Reservation<'l>,
}

impl ExtractedBytes<'_> {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes currently checked out for this extraction.
    pub fn reserved(&self) -> u64 {
        self.reservation.bytes()
    }
}

/// Reads entries under a [`SizeBudget`].
#[derive(Debug, Clone)]
pub struct BoundedExtractor {
    budget: SizeBudget,
}

impl BoundedExtractor {
    pub fn new(budget: SizeBudget) -> Self {
        Self { budget }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(SizeBudget::from_config(config))
    }

    pub fn budget(&self) -> &SizeBudget {
        &self.budget
    }

    /// Check the entry's declared size against the per-file ceiling and probe
    /// the ledger for its compressed size. Returns the declared size.
    pub fn check_size(
        &self,
        entry: &LibraryEntry,
        ledger: &MemoryLedger,
    ) -> Result<u64, DetectionError> {
        let size = self.check_declared(entry)?;
        // Probe only; the checkout is released immediately.
        ledger.checkout(&entry.path, entry.compressed_size)?;
        Ok(size)
    }

    /// Read the entry's bytes, holding a ledger checkout for as long as the
    /// returned value lives.
    pub fn extract<'l>(
        &self,
        reader: &mut dyn ArchiveReader,
        entry: &LibraryEntry,
        ledger: &'l MemoryLedger,
    ) -> Result<ExtractedBytes<'l>, DetectionError> {
        self.check_declared(entry)?;
        let mut reservation = ledger.checkout(&entry.path, entry.compressed_size)?;

        let limit = self.budget.max_file_size;
        let capacity = entry
            .uncompressed_size
            .unwrap_or(entry.compressed_size)
            .min(limit) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        {
            let stream = reader.open_entry(&entry.path)?;
            stream.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
        }

        let observed = bytes.len() as u64;
        if observed > limit {
            return Err(DetectionError::SizeLimitExceeded {
                path: entry.path.clone(),
                size: observed,
                limit,
            });
        }
        reservation.resize(observed)?;

        tracing::trace!(
            path = %entry.path,
            bytes = observed,
            outstanding = ledger.outstanding(),
            "extracted entry"
        );
        Ok(ExtractedBytes { bytes, reservation })
    }

    fn check_declared(&self, entry: &LibraryEntry) -> Result<u64, DetectionError> {
        let size = entry.declared_size();
        if size > self.budget.max_file_size {
            return Err(DetectionError::SizeLimitExceeded {
                path: entry.path.clone(),
                size,
                limit: self.budget.max_file_size,
            });
        }
        Ok(size)
    }
}
