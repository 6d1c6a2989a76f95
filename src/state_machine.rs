//! Session conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the transition function decides, the runtime applies the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{Message, Origin, SessionContext, SessionPhase, SessionState, TurnFailure};
pub use transition::{transition, TransitionError};
