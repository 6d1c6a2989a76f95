//! Effects produced by state transitions

use super::state::{Message, TurnFailure};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the completion gateway with the latest user turn
    RequestCompletion { user_text: String },

    /// Append a turn to the history
    AppendMessage(Message),

    /// Remember that the latest turn failed
    RecordFailure(TurnFailure),

    /// Forget the previous failure
    ClearFailure,

    /// Add reported usage to the token counter
    AddTokens(u64),
}

impl Effect {
    pub fn append_human(text: impl Into<String>) -> Self {
        Effect::AppendMessage(Message::human(text))
    }

    pub fn append_ai(text: impl Into<String>) -> Self {
        Effect::AppendMessage(Message::ai(text))
    }
}
