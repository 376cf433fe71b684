//! Core types for the assistant

pub mod document;
pub mod request;
pub mod response;

pub use document::{Chunk, ChunkKind, FileType, UploadedFile};
pub use request::{AskRequest, HistoryResponse, RoleRequest, SpeechRequest};
pub use response::{AskResponse, BatchReport, FileReport, ProcessingStatus, SourceRef};
