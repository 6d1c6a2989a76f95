//! API request and response types

use crate::gateway::GatewayErrorKind;
use crate::runtime::SessionSnapshot;
use serde::{Deserialize, Serialize};

/// Form posted by the chat page
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub human_prompt: String,
}

/// Request to stage input
#[derive(Debug, Deserialize)]
pub struct StageInputRequest {
    pub text: String,
}

/// Response for a completed submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub reply: String,
    pub session: SessionSnapshot,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Model information
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<GatewayErrorKind>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: None,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: GatewayErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }
}
