//! Response types for questions and upload batches

use serde::{Deserialize, Serialize};

use super::document::{ChunkKind, FileType};
use crate::retrieval::SearchHit;
use crate::routing::QueryRoute;

/// Retrieved chunk surfaced alongside an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source filename
    pub filename: String,
    pub kind: ChunkKind,
    /// Chunk position within the source
    pub ordinal: usize,
    /// Cosine similarity to the question
    pub score: f32,
    /// Leading text of the chunk
    pub snippet: String,
}

impl SourceRef {
    const SNIPPET_CHARS: usize = 200;

    /// Build a source reference from a search hit
    pub fn from_hit(hit: &SearchHit) -> Self {
        let snippet: String = hit.chunk.text.chars().take(Self::SNIPPET_CHARS).collect();
        Self {
            filename: hit.chunk.source.clone(),
            kind: hit.chunk.kind,
            ordinal: hit.chunk.ordinal,
            score: hit.score,
            snippet,
        }
    }
}

/// Answer to a user question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer text
    pub answer: String,
    /// Path the question took
    pub route: QueryRoute,
    /// Chunks used as context (empty for analysis answers)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Per-file state within one upload batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Outcome for one file of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Filename as uploaded
    pub filename: String,
    /// Detected type, if the extension is supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    pub status: ProcessingStatus,
    /// Chunks added to the index
    pub chunks_created: usize,
    /// Failure message naming the file and cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable failure kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl FileReport {
    /// Create a pending entry
    pub fn pending(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_type: None,
            status: ProcessingStatus::Pending,
            chunks_created: 0,
            message: None,
            error_type: None,
        }
    }
}

/// Result of processing one upload batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Files processed in this batch, in upload order
    pub files: Vec<FileReport>,
    /// Files skipped because they were already processed or repeated in the batch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl BatchReport {
    /// True when every processed file completed (vacuously true for an empty batch)
    pub fn is_fully_successful(&self) -> bool {
        self.files
            .iter()
            .all(|f| f.status == ProcessingStatus::Complete)
    }

    /// Files that completed
    pub fn completed(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| f.status == ProcessingStatus::Complete)
    }

    /// Files that failed
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| f.status == ProcessingStatus::Failed)
    }

    /// Status for a filename, if it was part of this batch
    pub fn status_of(&self, filename: &str) -> Option<ProcessingStatus> {
        self.files
            .iter()
            .find(|f| f.filename == filename)
            .map(|f| f.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, status: ProcessingStatus) -> FileReport {
        FileReport {
            status,
            ..FileReport::pending(name)
        }
    }

    #[test]
    fn test_batch_success_requires_all_complete() {
        let mut batch = BatchReport {
            files: vec![
                report("a.pdf", ProcessingStatus::Complete),
                report("b.csv", ProcessingStatus::Complete),
            ],
            ..Default::default()
        };
        assert!(batch.is_fully_successful());

        batch.files.push(report("c.pdf", ProcessingStatus::Failed));
        assert!(!batch.is_fully_successful());
        assert_eq!(batch.completed().count(), 2);
        assert_eq!(batch.failed().count(), 1);
        assert_eq!(batch.status_of("c.pdf"), Some(ProcessingStatus::Failed));
        assert_eq!(batch.status_of("missing.pdf"), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessingStatus::Complete).unwrap();
        assert_eq!(json, "\"complete\"");
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(!ProcessingStatus::Pending.is_terminal());
    }
}
