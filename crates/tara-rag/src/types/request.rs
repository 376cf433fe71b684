//! Request bodies for the HTTP API

use serde::{Deserialize, Serialize};

use crate::conversation::{Role, Turn};

/// Question for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Role switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// Text to speak; the latest answer when omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Chat history of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub turns: Vec<Turn>,
}
