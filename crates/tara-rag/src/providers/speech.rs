//! Text-to-speech provider

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::SpeechConfig;
use crate::error::Result;

/// Trait for converting answer text to audio.
///
/// Failures never propagate: implementations log and return `None`.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize audio for `text`
    async fn synthesize(&self, text: &str) -> Option<Bytes>;

    /// MIME type of the produced audio
    fn content_type(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Cut `text` to `max_chars` characters and mark the cut with "..."
pub fn truncate_for_speech(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

/// ElevenLabs text-to-speech client
pub struct ElevenLabsSpeech {
    client: Client,
    api_key: String,
    config: SpeechConfig,
}

impl ElevenLabsSpeech {
    pub fn new(config: &SpeechConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }

    /// Create a client when a key is configured; `None` means speech is unavailable
    pub fn from_config(config: &SpeechConfig) -> Result<Option<Self>> {
        match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(Some(Self::new(config, key)?)),
            None => Ok(None),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        )
    }

    async fn convert(&self, text: &str) -> std::result::Result<Bytes, String> {
        let request = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
                style: self.config.style,
                use_speaker_boost: self.config.use_speaker_boost,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("output_format", self.config.output_format.as_str())])
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {} - {}", status, body));
        }

        response.bytes().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsSpeech {
    async fn synthesize(&self, text: &str) -> Option<Bytes> {
        let text = truncate_for_speech(text, self.config.max_chars);

        match self.convert(&text).await {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => {
                tracing::warn!("Text-to-speech returned no audio");
                None
            }
            Err(e) => {
                tracing::warn!("Error converting text to speech: {}", e);
                None
            }
        }
    }

    fn content_type(&self) -> &str {
        "audio/mpeg"
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}
