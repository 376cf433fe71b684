//! Provider abstractions for embeddings, generation and speech
//!
//! Trait-based seams so the session logic can run against Ollama, Gemini
//! and ElevenLabs in production and against offline providers in tests.

pub mod embedding;
pub mod gemini;
pub mod hashing;
pub mod llm;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod ollama;
pub mod speech;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use hashing::HashingEmbedder;
pub use llm::LlmProvider;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{ScriptedLlm, SwitchableEmbedder};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use speech::{truncate_for_speech, ElevenLabsSpeech, SpeechProvider};
