//! Upload and chunk types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// CSV file
    Csv,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// Old Excel spreadsheet (.xls)
    Xls,
}

impl FileType {
    /// Detect file type from extension (case-insensitive, with or without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Detect file type from a filename, failing with `UnsupportedFormat`
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        Self::from_extension(ext).ok_or_else(|| {
            let shown = if ext.is_empty() {
                "(no extension)".to_string()
            } else {
                format!(".{}", ext)
            };
            Error::UnsupportedFormat(format!(
                "{} has extension {}; supported: .pdf, .csv, .xlsx, .xls",
                filename, shown
            ))
        })
    }

    /// Tabular files go through the dataset loader
    pub fn is_tabular(&self) -> bool {
        matches!(self, Self::Csv | Self::Xlsx | Self::Xls)
    }

    /// Canonical lowercase extension with leading dot
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Csv => ".csv",
            Self::Xlsx => ".xlsx",
            Self::Xls => ".xls",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Csv => "CSV",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
            Self::Xls => "Excel Spreadsheet (.xls)",
        }
    }
}

/// A file handed over by the upload boundary
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as uploaded by the user
    pub name: String,
    /// Raw file bytes
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// SHA-256 of the file bytes, hex encoded
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        hex::encode(hasher.finalize())
    }
}

/// Where a chunk's text came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Extracted document text
    Document,
    /// Descriptor standing in for a tabular file
    Tabular,
}

/// A chunk of text from an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Source filename
    pub source: String,
    pub kind: ChunkKind,
    /// Position within the source
    pub ordinal: usize,
    /// Text content
    pub text: String,
    /// Character offset in the joined source text
    pub char_start: usize,
    /// Length in characters
    pub char_len: usize,
}

impl Chunk {
    /// Create a document chunk
    pub fn document(source: impl Into<String>, ordinal: usize, text: String, char_start: usize) -> Self {
        let char_len = text.chars().count();
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            kind: ChunkKind::Document,
            ordinal,
            text,
            char_start,
            char_len,
        }
    }

    /// Create the single descriptor chunk for a tabular file
    pub fn tabular(source: impl Into<String>, text: String) -> Self {
        let char_len = text.chars().count();
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            kind: ChunkKind::Tabular,
            ordinal: 0,
            text,
            char_start: 0,
            char_len,
        }
    }

    /// Char offset one past the end
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection_is_case_insensitive() {
        assert_eq!(FileType::from_filename("Notes.PDF").unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_filename("grades.Xlsx").unwrap(), FileType::Xlsx);
        assert_eq!(FileType::from_extension(".csv"), Some(FileType::Csv));
        assert!(FileType::Xls.is_tabular());
        assert!(!FileType::Pdf.is_tabular());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileType::from_filename("essay.docx").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(err.to_string().contains("essay.docx"));

        assert!(FileType::from_filename("README").is_err());
    }

    #[test]
    fn test_chunk_lengths_count_chars() {
        let chunk = Chunk::document("a.pdf", 0, "héllo".to_string(), 10);
        assert_eq!(chunk.char_len, 5);
        assert_eq!(chunk.char_end(), 15);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = UploadedFile::new("a.csv", b"x,y\n1,2\n".to_vec());
        let b = UploadedFile::new("b.csv", b"x,y\n1,2\n".to_vec());
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
