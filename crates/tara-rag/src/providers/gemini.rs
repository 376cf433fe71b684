//! Gemini API client used as the tabular analysis backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::providers::llm::LlmProvider;

/// Gemini client authenticated with an API key
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with an explicit key
    pub fn new(config: &AnalysisConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client when a key is configured; `None` means analysis is unavailable
    pub fn from_config(config: &AnalysisConfig) -> Result<Option<Self>> {
        match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(Some(Self::new(config, key)?)),
            None => Ok(None),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain".to_string(),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!(
                "Gemini generation failed ({}): {}",
                status, body
            )));
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Failed to parse Gemini response: {}", e)))?;

        // A candidate may split its answer across several parts
        let text: String = gen_response
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::generation("No text in Gemini response"));
        }
        Ok(text)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.api_key.is_empty())
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_means_unconfigured() {
        let config = AnalysisConfig::default();
        assert!(GeminiClient::from_config(&config).unwrap().is_none());

        let blank = AnalysisConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(GeminiClient::from_config(&blank).unwrap().is_none());
    }

    #[test]
    fn test_endpoint_uses_model() {
        let config = AnalysisConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let client = GeminiClient::from_config(&config).unwrap().unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_response_parts_are_joined() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Mean is "},{"text":"4.2"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "Mean is 4.2");
    }
}
