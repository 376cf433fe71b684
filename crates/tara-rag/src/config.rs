//! Configuration for the assistant

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TARA_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaraConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Ollama generation configuration
    pub llm: LlmConfig,
    /// Tabular analysis backend configuration
    pub analysis: AnalysisConfig,
    /// Tabular loader configuration
    pub tabular: TabularConfig,
    /// Text-to-speech configuration
    pub speech: SpeechConfig,
}

impl TaraConfig {
    /// Load configuration from `TARA_CONFIG`, the user config dir, or defaults,
    /// then apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                dirs::config_dir()
                    .map(|dir| dir.join("tara").join("config.toml"))
                    .filter(|p| p.exists())
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        tracing::info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Parse TOML config text; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("TARA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("TARA_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("TARA_GENERATE_MODEL") {
            self.llm.generate_model = model;
        }
        if let Ok(model) = std::env::var("TARA_EMBED_MODEL") {
            self.llm.embed_model = model;
        }
        if self.analysis.api_key.is_none() {
            self.analysis.api_key = non_empty_env(&self.analysis.api_key_env);
        }
        if self.speech.api_key.is_none() {
            self.speech.api_key = non_empty_env(&self.speech.api_key_env);
        }
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.document_top_k == 0 || self.retrieval.tabular_top_k == 0 {
            return Err(Error::Config("retrieval top_k values must be >= 1".to_string()));
        }
        if self.embeddings.provider == EmbeddingBackend::Hashing && self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be > 0".to_string()));
        }
        if self.speech.max_chars == 0 {
            return Err(Error::Config("speech.max_chars must be > 0".to_string()));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Sessions untouched for this many seconds are dropped; 0 keeps them forever
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024,
            session_idle_secs: 2 * 60 * 60,
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama embeddings endpoint
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend selection
    pub provider: EmbeddingBackend,
    /// Embedding dimensions (384 for all-minilm, used by the hashing embedder)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            dimensions: 384,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved once document text is indexed
    pub document_top_k: usize,
    /// Chunks retrieved while only tabular descriptors are indexed
    pub tabular_top_k: usize,
    /// Rewrite follow-up questions into standalone questions before retrieval
    pub condense_question: bool,
    /// Most recent turns included in the prompt (None = whole memory)
    pub max_history_turns: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            document_top_k: 4,
            tabular_top_k: 1,
            condense_question: false,
            max_history_turns: None,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a failed request (0 = single attempt)
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "all-minilm".to_string(),
            generate_model: "gemma3:4b".to_string(),
            temperature: 0.5,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// Tabular analysis backend (Gemini) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// API key; normally supplied through `api_key_env`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Gemini model name
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Tabular loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    /// Sample values per column in profiles
    pub sample_size: usize,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self { sample_size: 5 }
    }
}

/// Text-to-speech (ElevenLabs) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// API key; normally supplied through `api_key_env`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API base URL
    pub base_url: String,
    /// Voice identifier
    pub voice_id: String,
    /// Speech model identifier
    pub model_id: String,
    /// Audio output format
    pub output_format: String,
    /// Character ceiling; longer text is truncated with "..."
    pub max_chars: usize,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "ELEVENLABS_API_KEY".to_string(),
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            voice_id: "pNInz6obpgDQGcFmaJgB".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_22050_32".to_string(),
            max_chars: 5000,
            stability: 0.0,
            similarity_boost: 1.0,
            style: 0.0,
            use_speaker_boost: true,
            timeout_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TaraConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.document_top_k, 4);
        assert_eq!(config.retrieval.tabular_top_k, 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TaraConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 500
            chunk_overlap = 50

            [embeddings]
            provider = "hashing"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.embeddings.provider, EmbeddingBackend::Hashing);
        assert_eq!(config.llm.generate_model, "gemma3:4b");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = TaraConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_keys_are_not_serialized() {
        let mut config = TaraConfig::default();
        config.analysis.api_key = Some("secret".to_string());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }
}
