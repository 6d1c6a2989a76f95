//! Session state types

use super::Effect;
use crate::gateway::GatewayErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who contributed a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Human,
    Ai,
}

/// One turn of the conversation. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub origin: Origin,
    pub text: String,
}

impl Message {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Human,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Ai,
            text: text.into(),
        }
    }
}

/// Where the session is in its request/response cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionPhase {
    /// No submission in flight
    Idle,
    /// Gateway call outstanding for `user_text`
    AwaitingReply { user_text: String },
}

impl SessionPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionPhase::Idle)
    }
}

/// A turn that did not get its reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnFailure {
    pub kind: GatewayErrorKind,
    pub message: String,
}

/// Static per-session settings the transition function consults
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Add reported usage to the token counter on each reply
    pub meter_tokens: bool,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            meter_tokens: false,
        }
    }

    #[must_use]
    pub fn with_metering(mut self, meter_tokens: bool) -> Self {
        self.meter_tokens = meter_tokens;
        self
    }
}

/// All mutable state of one chat session
#[derive(Debug, Clone)]
pub struct SessionState {
    history: Vec<Message>,
    pending_input: String,
    token_count: u64,
    phase: SessionPhase,
    last_error: Option<TurnFailure>,
    started_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            pending_input: String::new(),
            token_count: 0,
            phase: SessionPhase::Idle,
            last_error: None,
            started_at: Utc::now(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn token_count(&self) -> u64 {
        self.token_count
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn last_error(&self) -> Option<&TurnFailure> {
        self.last_error.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Stage text for the next submission. Last write wins.
    pub fn stage_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Move the staged text out, leaving the buffer empty.
    pub(crate) fn take_pending_input(&mut self) -> String {
        std::mem::take(&mut self.pending_input)
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    /// Apply a data effect. Effects that need I/O are handed back.
    pub(crate) fn apply(&mut self, effect: Effect) -> Option<Effect> {
        match effect {
            Effect::AppendMessage(message) => self.history.push(message),
            Effect::RecordFailure(failure) => self.last_error = Some(failure),
            Effect::ClearFailure => self.last_error = None,
            Effect::AddTokens(tokens) => {
                self.token_count = self.token_count.saturating_add(tokens);
            }
            io @ Effect::RequestCompletion { .. } => return Some(io),
        }
        None
    }
}
