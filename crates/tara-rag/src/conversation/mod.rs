//! Conversation state: roles, memory and the retrieval-augmented engine

pub mod engine;
pub mod memory;
pub mod roles;

pub use engine::{ConversationEngine, EngineAnswer, EngineProviders};
pub use memory::{ConversationMemory, Speaker, Turn};
pub use roles::Role;
