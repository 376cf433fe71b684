//! Error types for the assistant

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Assistant errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or incomplete client request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upload with an extension we do not ingest
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt or unreadable file
    #[error("Failed to parse file '{filename}': {message}")]
    Parse { filename: String, message: String },

    /// Embedding backend failure during index build/extend or query embedding
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generation backend failure at ask time
    #[error("Generation backend error: {0}")]
    Generation(String),

    /// A backend credential is missing
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// The operation needs data that has not been loaded
    #[error("No data: {0}")]
    NoData(String),

    /// `build` was called without any chunks
    #[error("Cannot build a vector index from zero chunks")]
    EmptyIndex,

    /// `extend` was requested before any index exists
    #[error("Vector index has not been built yet")]
    IndexNotBuilt,

    /// Unknown session id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a no-data error
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable kind, used in API bodies and batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::Parse { .. } => "parse_failure",
            Error::Embedding(_) => "embedding_failure",
            Error::Generation(_) => "generation_backend_error",
            Error::NotConfigured(_) => "not_configured",
            Error::NoData(_) => "no_data",
            Error::EmptyIndex => "empty_index",
            Error::IndexNotBuilt => "index_not_built",
            Error::SessionNotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) | Error::InvalidRequest(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NoData(_) | Error::IndexNotBuilt => StatusCode::CONFLICT,
            Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Error::NotConfigured(_) | Error::Generation(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Embedding(_) | Error::EmptyIndex | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_file() {
        let err = Error::parse("notes.pdf", "bad xref table");
        assert_eq!(
            err.to_string(),
            "Failed to parse file 'notes.pdf': bad xref table"
        );
        assert_eq!(err.kind(), "parse_failure");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::invalid_request("no files").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NoData("empty".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::SessionNotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::UnsupportedFormat(".docx".into()).into_response().status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
