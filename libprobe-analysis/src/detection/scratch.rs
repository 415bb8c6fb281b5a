//! Private scratch files for handing library bytes to the evidence source.
//!
//! Each file has a unique name and is removed when dropped, whatever the
//! outcome of the step that created it. Removal failures are logged only.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use libprobe_core::DetectionError;
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct ScratchFile {
    file: Option<NamedTempFile>,
}

impl ScratchFile {
    /// Write `bytes` to a fresh temporary file.
    pub fn write(bytes: &[u8]) -> Result<Self, DetectionError> {
        let mut file = tempfile::Builder::new()
            .prefix("libprobe-")
            .suffix(".so")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file: Some(file) })
    }

    pub fn path(&self) -> &Path {
        match &self.file {
            Some(f) => f.path(),
            None => Path::new(""),
        }
    }

    /// Modification time of the scratch copy.
    pub fn modified(&self) -> Result<DateTime<Utc>, DetectionError> {
        let modified = std::fs::metadata(self.path())?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        let path = file.path().display().to_string();
        if let Err(e) = file.close() {
            let err = DetectionError::ResourceCleanupFailure {
                path,
                message: e.to_string(),
            };
            tracing::warn!(error = %err, "scratch file cleanup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_is_removed_on_drop() {
        let scratch = ScratchFile::write(b"\x7fELF").unwrap();
        let path = scratch.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x7fELF");
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_names_are_unique() {
        let a = ScratchFile::write(b"a").unwrap();
        let b = ScratchFile::write(b"b").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
