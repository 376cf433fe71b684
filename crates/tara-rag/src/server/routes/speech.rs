//! Text-to-speech endpoint

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::conversation::Speaker;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::SpeechRequest;

/// POST /api/sessions/:id/speech - Speak the given text or the latest answer.
///
/// Responds 204 when synthesis produced no audio.
pub async fn speak(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response> {
    let session = state.session(&id)?;

    let speech = state.speech().ok_or_else(|| {
        Error::NotConfigured(format!(
            "text-to-speech needs {}",
            state.config().speech.api_key_env
        ))
    })?;

    let text = match request.text.filter(|t| !t.trim().is_empty()) {
        Some(text) => text,
        None => {
            let session = session.lock().await;
            session
                .history()
                .iter()
                .rev()
                .find(|t| t.role == Speaker::Assistant)
                .map(|t| t.content.clone())
                .ok_or_else(|| Error::no_data("no answer to speak yet"))?
        }
    };

    match speech.synthesize(&text).await {
        Some(audio) => Ok((
            [(header::CONTENT_TYPE, speech.content_type().to_string())],
            audio,
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
