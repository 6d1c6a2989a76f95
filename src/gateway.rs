//! Completion gateway
//!
//! The boundary between a session and the remote model: one user turn in,
//! one reply out. Only the latest turn is forwarded; earlier history is
//! never sent, so the model sees each question in isolation.

use crate::llm::{LlmError, LlmErrorKind, LlmMessage, LlmRequest, LlmService};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Failure classes a caller can act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    /// Remote endpoint unreachable, timed out, throttled or failing
    Transport,
    /// Credential missing or rejected
    Auth,
    /// Request refused as malformed, or a reply we cannot use
    Protocol,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Auth error: {0}")]
    Auth(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Transport(_) => GatewayErrorKind::Transport,
            GatewayError::Auth(_) => GatewayErrorKind::Auth,
            GatewayError::Protocol(_) => GatewayErrorKind::Protocol,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            GatewayError::Transport(m) | GatewayError::Auth(m) | GatewayError::Protocol(m) => m,
        }
    }
}

impl From<LlmError> for GatewayError {
    fn from(e: LlmError) -> Self {
        match e.kind {
            LlmErrorKind::Network | LlmErrorKind::RateLimit | LlmErrorKind::ServerError => {
                GatewayError::Transport(e.message)
            }
            LlmErrorKind::Auth => GatewayError::Auth(e.message),
            LlmErrorKind::InvalidRequest | LlmErrorKind::MalformedResponse => {
                GatewayError::Protocol(e.message)
            }
        }
    }
}

/// A single assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Total tokens the service reported for the exchange, zero if unreported
    pub tokens_used: u64,
}

/// Turns one user message into one assistant reply
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, user_text: &str) -> Result<Completion, GatewayError>;
}

#[async_trait]
impl<T: CompletionGateway + ?Sized> CompletionGateway for Arc<T> {
    async fn complete(&self, user_text: &str) -> Result<Completion, GatewayError> {
        (**self).complete(user_text).await
    }
}

/// Gateway backed by an LLM service and a fixed persona
pub struct LlmGateway {
    llm: Arc<dyn LlmService>,
    system_prompt: String,
}

impl LlmGateway {
    pub fn new(llm: Arc<dyn LlmService>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// The persona followed by the user turn, one choice requested.
    fn build_request(&self, user_text: &str) -> LlmRequest {
        LlmRequest {
            messages: vec![
                LlmMessage::system(self.system_prompt.clone()),
                LlmMessage::user(user_text),
            ],
            choice_count: 1,
        }
    }
}

#[async_trait]
impl CompletionGateway for LlmGateway {
    async fn complete(&self, user_text: &str) -> Result<Completion, GatewayError> {
        let request = self.build_request(user_text);
        let response = self.llm.complete(&request).await?;

        Ok(Completion {
            text: response.text,
            tokens_used: response.usage.total(),
        })
    }
}
