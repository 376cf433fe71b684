//! Question endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /api/sessions/:id/ask - Ask a question against the session's materials
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let session = state.session(&id)?;

    tracing::info!("Question: \"{}\"", request.question);

    let response = session.lock().await.ask(&request.question).await?;

    tracing::info!(
        "Answered via {} in {}ms ({} sources)",
        response.route,
        response.processing_time_ms,
        response.sources.len()
    );

    Ok(Json(response))
}
