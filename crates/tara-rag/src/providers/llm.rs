//! Generation backend seam

use async_trait::async_trait;

use crate::error::Result;

/// Single-prompt text generation.
///
/// `OllamaLlm` answers narrative questions; `GeminiClient` answers tabular
/// analysis questions. Neither keeps state between calls.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a fully built prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    async fn health_check(&self) -> Result<bool>;

    /// Lowercase backend identifier, e.g. `ollama`
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Backend name as shown to users
    fn label(&self) -> String {
        let mut chars = self.name().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
