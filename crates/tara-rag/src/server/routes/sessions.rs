//! Session lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::session::SessionSummary;
use crate::types::{HistoryResponse, RoleRequest};

/// POST /api/sessions - Start a session
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSummary>) {
    let session = state.create_session();
    let summary = session.lock().await.summary();
    (StatusCode::CREATED, Json(summary))
}

/// GET /api/sessions/:id - Session summary
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>> {
    let session = state.session(&id)?;
    let summary = session.lock().await.summary();
    Ok(Json(summary))
}

/// DELETE /api/sessions/:id - End a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.remove_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/:id/role - Switch between student and professor
pub async fn set_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<SessionSummary>> {
    let session = state.session(&id)?;
    let mut session = session.lock().await;
    session.set_role(request.role);
    tracing::info!("Session {} role set to {}", id, request.role);
    Ok(Json(session.summary()))
}

/// GET /api/sessions/:id/history - Chat history
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>> {
    let session = state.session(&id)?;
    let turns = session.lock().await.history().to_vec();
    Ok(Json(HistoryResponse { turns }))
}

/// DELETE /api/sessions/:id/knowledge - Clear the knowledge base
pub async fn clear_knowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>> {
    let session = state.session(&id)?;
    let mut session = session.lock().await;
    session.clear_knowledge_base();
    Ok(Json(session.summary()))
}
