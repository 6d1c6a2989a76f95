//! Session executor
//!
//! Drives one session through the state machine: feeds events to the pure
//! transition function, applies the resulting effects to the session state,
//! and performs the gateway call the effects ask for.

use crate::gateway::{CompletionGateway, GatewayError, GatewayErrorKind};
use crate::state_machine::{
    transition, Effect, Event, SessionContext, SessionState, TransitionError,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Submission aborted: {0}")]
    Aborted(String),
}

/// One user's chat session
pub struct ChatSession {
    context: SessionContext,
    state: SessionState,
    gateway: Arc<dyn CompletionGateway>,
}

impl ChatSession {
    pub fn new(context: SessionContext, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            context,
            state: SessionState::new(),
            gateway,
        }
    }

    pub fn id(&self) -> &str {
        &self.context.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage_input(&mut self, text: impl Into<String>) {
        self.state.stage_input(text);
    }

    /// Send the staged input and record the exchange.
    ///
    /// The staged input is cleared whatever the outcome. On success the
    /// human turn and the reply are appended in that order and the reply is
    /// returned; on failure only the human turn is appended and the gateway
    /// error is returned.
    pub async fn submit(&mut self) -> Result<String, SubmitError> {
        let user_text = self.state.take_pending_input();
        let Some(user_text) = self.dispatch(Event::Submit { user_text })? else {
            return Err(TransitionError::InvalidTransition(
                "submission produced no completion request".to_string(),
            )
            .into());
        };

        tracing::debug!(
            session_id = %self.context.session_id,
            chars = user_text.len(),
            "Requesting completion"
        );

        match self.gateway.complete(&user_text).await {
            Ok(completion) => {
                let reply = completion.text.clone();
                self.dispatch(Event::ReplyReceived {
                    text: completion.text,
                    tokens_used: completion.tokens_used,
                })?;
                tracing::info!(
                    session_id = %self.context.session_id,
                    turns = self.state.history().len(),
                    tokens_used = completion.tokens_used,
                    "Turn completed"
                );
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    kind = ?e.kind(),
                    detail = %e.detail(),
                    "Turn failed"
                );
                self.dispatch(Event::ReplyFailed {
                    kind: e.kind(),
                    message: e.to_string(),
                })?;
                Err(e.into())
            }
        }
    }

    /// Close out a submission whose task died before the gateway answered,
    /// recording it as a failed turn so the session accepts new input.
    pub fn abandon_pending(&mut self, reason: &str) {
        if self.state.phase().is_idle() {
            return;
        }
        tracing::warn!(
            session_id = %self.context.session_id,
            reason,
            "Abandoning in-flight submission"
        );
        let failed = Event::ReplyFailed {
            kind: GatewayErrorKind::Transport,
            message: format!("Submission aborted: {reason}"),
        };
        if let Err(e) = self.dispatch(failed) {
            tracing::error!(session_id = %self.context.session_id, error = %e, "Could not abandon submission");
        }
    }

    /// Run one transition and apply its effects. Returns the user text
    /// when the transition asks for a completion.
    fn dispatch(&mut self, event: Event) -> Result<Option<String>, TransitionError> {
        let result = transition(self.state.phase(), &self.context, event)?;
        self.state.set_phase(result.new_phase);

        let mut requested = None;
        for effect in result.effects {
            if let Some(Effect::RequestCompletion { user_text }) = self.state.apply(effect) {
                requested = Some(user_text);
            }
        }
        Ok(requested)
    }
}
