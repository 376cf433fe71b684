//! Prompt construction for the generation backends

pub mod prompt;

pub use prompt::PromptBuilder;
