//! Temporary on-disk staging for uploaded bytes

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::UploadedFile;

/// Creates staged copies of uploads, optionally inside a fixed directory
#[derive(Debug, Clone, Default)]
pub struct Stager {
    dir: Option<PathBuf>,
}

impl Stager {
    /// Stage into the system temp directory
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Stage into `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Write the upload to a temp file carrying `suffix`
    pub fn stage(&self, upload: &UploadedFile, suffix: &str) -> Result<StagedFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tara-upload-").suffix(suffix);

        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| Error::internal(format!("Failed to stage {}: {}", upload.name, e)))?;

        file.write_all(&upload.data)?;
        file.flush()?;

        tracing::debug!(
            "Staged {} ({} bytes) at {}",
            upload.name,
            upload.data.len(),
            file.path().display()
        );

        Ok(StagedFile { file })
    }
}

/// An upload written to disk; the file is removed when this is dropped
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
