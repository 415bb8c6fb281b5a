//! Binary evidence: embedded strings and symbol names.
//!
//! The detection pipeline only consumes these two primitives through
//! [`BinaryEvidenceSource`]; it never walks ELF structures itself.

pub mod elf;
pub mod strings;

use std::path::Path;

use libprobe_core::errors::DetectionResult;

pub use elf::ElfEvidenceSource;
pub use strings::extract_printable_strings;

/// Exported and imported symbol names of one library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub exports: Vec<String>,
    pub imports: Vec<String>,
}

impl SymbolTable {
    pub fn new(exports: Vec<String>, imports: Vec<String>) -> Self {
        Self { exports, imports }
    }

    /// Exports followed by imports.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports
            .iter()
            .chain(self.imports.iter())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.imports.is_empty()
    }
}

/// Extracts evidence from a library materialized on disk.
pub trait BinaryEvidenceSource: Send + Sync {
    /// Printable strings embedded in the binary.
    fn strings(&self, path: &Path) -> DetectionResult<Vec<String>>;

    /// Exported and imported symbol names.
    fn symbols(&self, path: &Path) -> DetectionResult<SymbolTable>;
}
