//! Events that can occur in a session

use crate::gateway::GatewayErrorKind;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        user_text: String,
    },

    // Gateway events
    ReplyReceived {
        text: String,
        tokens_used: u64,
    },
    ReplyFailed {
        kind: GatewayErrorKind,
        message: String,
    },
}
