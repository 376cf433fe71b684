//! Ollama-based providers for embeddings and generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Ollama API client with optional retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Retry a request with exponential backoff; `max_retries = 0` is a single attempt
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Ollama request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let url = url.as_str();

        self.retry_request(|| async move {
            let request = EmbedRequest {
                model: &self.config.embed_model,
                prompt: text,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::embedding(format!("Ollama embedding request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::embedding(format!(
                    "Ollama embedding failed: HTTP {}",
                    response.status()
                )));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse Ollama embedding response: {}", e))
            })?;

            Ok(embed_response.embedding)
        })
        .await
    }

    /// Generate a completion for a prompt
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let url = url.as_str();
        tracing::info!("Generating answer with model: {}", self.config.generate_model);

        self.retry_request(|| async move {
            let request = GenerateRequest {
                model: &self.config.generate_model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.config.temperature,
                },
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::generation(format!("Ollama request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::generation(format!(
                    "Ollama generation failed: HTTP {} - {}",
                    status, body
                )));
            }

            let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                Error::generation(format!("Failed to parse Ollama response: {}", e))
            })?;

            Ok(generate_response.response.trim().to_string())
        })
        .await
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &LlmConfig, dimensions: usize) -> Result<Self> {
        Ok(Self::from_client(Arc::new(OllamaClient::new(config)?), dimensions))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for narrative answers
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self::from_client(Arc::new(OllamaClient::new(config)?)))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.client.config().generate_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> LlmConfig {
        LlmConfig {
            // Discard port; nothing answers HTTP there
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_generation_error() {
        let llm = OllamaLlm::new(&unreachable_config()).unwrap();
        let err = llm.generate("hello").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(llm.model(), "gemma3:4b");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_embedding_error() {
        let embedder = OllamaEmbedder::new(&unreachable_config(), 384).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(!embedder.health_check().await.unwrap());
    }
}
