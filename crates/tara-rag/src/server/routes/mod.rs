//! API routes for the TARA server

pub mod ask;
pub mod documents;
pub mod sessions;
pub mod speech;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Sessions
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/sessions/:id/role", put(sessions::set_role))
        .route("/sessions/:id/history", get(sessions::get_history))
        .route("/sessions/:id/knowledge", delete(sessions::clear_knowledge))
        // Uploads - with larger body limit for files
        .route(
            "/sessions/:id/documents",
            post(documents::upload_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Questions
        .route("/sessions/:id/ask", post(ask::ask))
        .route("/sessions/:id/speech", post(speech::speak))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "tara-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Teaching assistant answering questions from uploaded course materials",
        "supported_formats": [".pdf", ".csv", ".xlsx", ".xls"],
        "endpoints": {
            "POST /api/sessions": "Start a session",
            "GET /api/sessions/:id": "Session summary and processed materials",
            "DELETE /api/sessions/:id": "End a session and discard its data",
            "PUT /api/sessions/:id/role": "Switch between student and professor",
            "POST /api/sessions/:id/documents": "Upload and process files (multipart)",
            "POST /api/sessions/:id/ask": "Ask a question",
            "GET /api/sessions/:id/history": "Chat history",
            "DELETE /api/sessions/:id/knowledge": "Clear the knowledge base",
            "POST /api/sessions/:id/speech": "Speak text or the latest answer"
        }
    }))
}
