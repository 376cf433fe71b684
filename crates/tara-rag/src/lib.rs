//! tara-rag: retrieval-augmented teaching assistant
//!
//! Students and professors upload course materials (PDF, CSV, spreadsheets)
//! and ask questions about them. Documents are chunked and embedded into a
//! per-session vector index that grows with every upload; questions are
//! routed either to retrieval-augmented generation or, for computational
//! questions over tabular files, to a direct analysis backend.

pub mod analysis;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod routing;
pub mod server;
pub mod session;
pub mod tabular;
pub mod types;

pub use config::TaraConfig;
pub use conversation::{ConversationEngine, Role};
pub use error::{Error, Result};
pub use routing::{classify, QueryRoute};
pub use session::{Session, SessionServices};
pub use types::{AskResponse, BatchReport, Chunk, FileType, UploadedFile};
