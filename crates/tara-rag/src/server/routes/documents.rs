//! Document upload endpoint

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{BatchReport, UploadedFile};

/// POST /api/sessions/:id/documents - Upload and process a batch of files
pub async fn upload_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>> {
    let session = state.session(&id)?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::invalid_request(format!("Failed to read multipart field: {}", e))
    })? {
        // Form fields without a filename are not uploads
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field.bytes().await.map_err(|e| {
            Error::invalid_request(format!("Failed to read {}: {}", filename, e))
        })?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        uploads.push(UploadedFile::new(filename, data));
    }

    if uploads.is_empty() {
        return Err(Error::invalid_request("upload contained no files"));
    }

    let report = session.lock().await.process_batch(uploads).await;

    tracing::info!(
        "Batch for session {}: {} complete, {} failed, {} skipped in {}ms",
        id,
        report.completed().count(),
        report.failed().count(),
        report.skipped.len(),
        report.processing_time_ms
    );

    Ok(Json(report))
}
