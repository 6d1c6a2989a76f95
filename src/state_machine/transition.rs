//! Pure state transition function
//!
//! Given the same phase, context and event it always produces the same
//! next phase and effects, with no I/O.

use super::{Effect, Event, SessionContext, SessionPhase, TurnFailure};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_phase: SessionPhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(phase: SessionPhase) -> Self {
        Self {
            new_phase: phase,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A reply is still pending for this session")]
    SessionBusy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    phase: &SessionPhase,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (phase, event) {
        // Idle + Submit -> AwaitingReply
        (SessionPhase::Idle, Event::Submit { user_text }) => Ok(TransitionResult::new(
            SessionPhase::AwaitingReply {
                user_text: user_text.clone(),
            },
        )
        .with_effect(Effect::ClearFailure)
        .with_effect(Effect::RequestCompletion { user_text })),

        (SessionPhase::AwaitingReply { .. }, Event::Submit { .. }) => {
            Err(TransitionError::SessionBusy)
        }

        // The human turn is only recorded once the gateway has answered,
        // and always ahead of the reply it provoked.
        (SessionPhase::AwaitingReply { user_text }, Event::ReplyReceived { text, tokens_used }) => {
            let metered = (context.meter_tokens && tokens_used > 0)
                .then_some(Effect::AddTokens(tokens_used));
            Ok(TransitionResult::new(SessionPhase::Idle)
                .with_effect(Effect::append_human(user_text.clone()))
                .with_effect(Effect::append_ai(text))
                .with_effects(metered))
        }

        (SessionPhase::AwaitingReply { user_text }, Event::ReplyFailed { kind, message }) => {
            Ok(TransitionResult::new(SessionPhase::Idle)
                .with_effect(Effect::append_human(user_text.clone()))
                .with_effect(Effect::RecordFailure(TurnFailure { kind, message })))
        }

        (SessionPhase::Idle, Event::ReplyReceived { .. } | Event::ReplyFailed { .. }) => Err(
            TransitionError::InvalidTransition("no submission is awaiting a reply".to_string()),
        ),
    }
}
