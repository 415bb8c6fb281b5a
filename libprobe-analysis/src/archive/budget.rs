//! Size limits and the aggregate memory ledger.
//!
//! # Invariants
//! - Every checkout is represented by a [`Reservation`]; dropping it releases
//!   exactly the bytes it holds, on every exit path.
//! - The ledger never admits a checkout that would push the outstanding
//!   balance above its limit. Overflow counts as exceeding the limit.
//! - Each batch owns its own ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use libprobe_core::{DetectionError, ProbeConfig};

/// Per-file and aggregate byte ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBudget {
    pub max_file_size: u64,
    pub max_aggregate_memory: u64,
}

impl SizeBudget {
    pub fn new(max_file_size: u64, max_aggregate_memory: u64) -> Self {
        Self {
            max_file_size,
            max_aggregate_memory,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.effective_max_file_size(),
            config.effective_max_aggregate_memory(),
        )
    }
}

/// Counter of bytes currently checked out against an aggregate ceiling.
#[derive(Debug)]
pub struct MemoryLedger {
    limit: u64,
    outstanding: AtomicU64,
    peak: AtomicU64,
}

impl MemoryLedger {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            outstanding: AtomicU64::new(0),
            peak: AtomicU64::new(0),
        }
    }

    pub fn for_budget(budget: &SizeBudget) -> Self {
        Self::new(budget.max_aggregate_memory)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Bytes currently checked out.
    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Highest balance observed since construction.
    pub fn peak(&self) -> u64 {
        self.peak.load(Ordering::Acquire)
    }

    /// Check out `bytes` on behalf of `path`.
    pub fn checkout(&self, path: &str, bytes: u64) -> Result<Reservation<'_>, DetectionError> {
        self.acquire(path, bytes)?;
        Ok(Reservation {
            ledger: self,
            path: path.to_string(),
            bytes,
        })
    }

    fn acquire(&self, path: &str, bytes: u64) -> Result<(), DetectionError> {
        let mut current = self.outstanding.load(Ordering::Acquire);
        loop {
            let next = match current.checked_add(bytes) {
                Some(next) if next <= self.limit => next,
                _ => {
                    return Err(DetectionError::OutOfMemory {
                        path: path.to_string(),
                        requested: bytes,
                        outstanding: current,
                        limit: self.limit,
                    })
                }
            };
            match self.outstanding.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(next, Ordering::AcqRel);
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, bytes: u64) {
        let prev = self.outstanding.fetch_sub(bytes, Ordering::AcqRel);
        debug_assert!(prev >= bytes, "ledger released more than was checked out");
    }
}

/// Scoped checkout. Releases its bytes when dropped.
#[derive(Debug)]
pub struct Reservation<'l> {
    ledger: &'l MemoryLedger,
    path: String,
    bytes: u64,
}

impl Reservation<'_> {
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Re-size the checkout to `bytes`. On failure the existing amount stays held.
    pub fn resize(&mut self, bytes: u64) -> Result<(), DetectionError> {
        if bytes > self.bytes {
            self.ledger.acquire(&self.path, bytes - self.bytes)?;
        } else {
            self.ledger.release(self.bytes - bytes);
        }
        self.bytes = bytes;
        Ok(())
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.ledger.release(self.bytes);
    }
}
