//! Property-based tests for the session state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::gateway::GatewayErrorKind;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("prop-session")
}

/// One user-visible step against a session
#[derive(Debug, Clone)]
enum Step {
    Stage(String),
    Reply { text: String, tokens: u64 },
    Fail { kind: GatewayErrorKind, message: String },
}

fn step(state: &mut SessionState, event: Event, context: &SessionContext) -> Result<(), TransitionError> {
    let result = transition(state.phase(), context, event)?;
    state.set_phase(result.new_phase);
    for effect in result.effects {
        // The completion request is the gateway's job; tests answer it directly.
        let _ = state.apply(effect);
    }
    Ok(())
}

/// Submit the staged input and feed back the given gateway outcome.
fn submit(state: &mut SessionState, outcome: Event, context: &SessionContext) -> Result<(), TransitionError> {
    let user_text = state.take_pending_input();
    step(state, Event::Submit { user_text }, context)?;
    step(state, outcome, context)
}

fn run(steps: &[Step], context: &SessionContext) -> SessionState {
    let mut state = SessionState::new();
    for s in steps {
        match s.clone() {
            Step::Stage(text) => state.stage_input(text),
            Step::Reply { text, tokens } => submit(
                &mut state,
                Event::ReplyReceived {
                    text,
                    tokens_used: tokens,
                },
                context,
            )
            .unwrap(),
            Step::Fail { kind, message } => {
                submit(&mut state, Event::ReplyFailed { kind, message }, context).unwrap();
            }
        }
    }
    state
}

fn has_orphaned_reply(history: &[Message]) -> bool {
    history.iter().enumerate().any(|(i, msg)| {
        msg.origin == Origin::Ai && (i == 0 || history[i - 1].origin != Origin::Human)
    })
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_error_kind() -> impl Strategy<Value = GatewayErrorKind> {
    prop_oneof![
        Just(GatewayErrorKind::Transport),
        Just(GatewayErrorKind::Auth),
        Just(GatewayErrorKind::Protocol),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,30}".prop_map(Step::Stage),
        ("[a-zA-Z0-9 .!]{0,30}", 0u64..500).prop_map(|(text, tokens)| Step::Reply { text, tokens }),
        (arb_error_kind(), "[a-z ]{1,20}").prop_map(|(kind, message)| Step::Fail { kind, message }),
    ]
}

fn arb_phase() -> impl Strategy<Value = SessionPhase> {
    prop_oneof![
        Just(SessionPhase::Idle),
        "[a-z]{0,10}".prop_map(|user_text| SessionPhase::AwaitingReply { user_text }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-z]{0,10}".prop_map(|user_text| Event::Submit { user_text }),
        ("[a-z]{0,10}", 0u64..100).prop_map(|(text, tokens_used)| Event::ReplyReceived { text, tokens_used }),
        (arb_error_kind(), "[a-z]{1,10}").prop_map(|(kind, message)| Event::ReplyFailed { kind, message }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn successful_submit_appends_exactly_the_pair(
        prefix in proptest::collection::vec(arb_step(), 0..8),
        input in "[a-zA-Z ]{0,20}",
        reply in "[a-zA-Z ]{0,20}",
    ) {
        let context = test_context();
        let mut state = run(&prefix, &context);
        let before = state.history().to_vec();

        state.stage_input(input.clone());
        submit(&mut state, Event::ReplyReceived { text: reply.clone(), tokens_used: 7 }, &context).unwrap();

        let after = state.history();
        prop_assert_eq!(after.len(), before.len() + 2);
        prop_assert_eq!(&after[..before.len()], &before[..]);
        prop_assert_eq!(&after[before.len()], &Message::human(input));
        prop_assert_eq!(&after[before.len() + 1], &Message::ai(reply));
    }

    #[test]
    fn failed_submit_appends_only_the_human_turn(
        prefix in proptest::collection::vec(arb_step(), 0..8),
        input in "[a-zA-Z ]{0,20}",
        kind in arb_error_kind(),
    ) {
        let context = test_context();
        let mut state = run(&prefix, &context);
        let before = state.history().len();

        state.stage_input(input.clone());
        submit(&mut state, Event::ReplyFailed { kind, message: "boom".to_string() }, &context).unwrap();

        prop_assert_eq!(state.history().len(), before + 1);
        prop_assert_eq!(state.history().last(), Some(&Message::human(input)));
        prop_assert_eq!(state.last_error().map(|f| f.kind), Some(kind));
    }

    #[test]
    fn pending_input_is_empty_after_every_submit(steps in proptest::collection::vec(arb_step(), 1..16)) {
        let context = test_context();
        let mut state = SessionState::new();
        for s in &steps {
            match s.clone() {
                Step::Stage(text) => state.stage_input(text),
                Step::Reply { text, tokens } => {
                    submit(&mut state, Event::ReplyReceived { text, tokens_used: tokens }, &context).unwrap();
                    prop_assert!(state.pending_input().is_empty());
                }
                Step::Fail { kind, message } => {
                    submit(&mut state, Event::ReplyFailed { kind, message }, &context).unwrap();
                    prop_assert!(state.pending_input().is_empty());
                }
            }
            prop_assert!(state.phase().is_idle());
        }
    }

    #[test]
    fn history_never_holds_an_orphaned_reply(steps in proptest::collection::vec(arb_step(), 0..24)) {
        let state = run(&steps, &test_context());
        prop_assert!(!has_orphaned_reply(state.history()));
    }

    #[test]
    fn staging_is_last_write_wins(
        prefix in proptest::collection::vec(arb_step(), 0..8),
        writes in proptest::collection::vec("[a-z]{0,10}", 1..6),
    ) {
        let context = test_context();
        let mut state = run(&prefix, &context);
        let before = state.history().to_vec();

        for w in &writes {
            state.stage_input(w.clone());
        }

        prop_assert_eq!(state.pending_input(), writes.last().unwrap().as_str());
        prop_assert_eq!(state.history(), &before[..]);
    }

    #[test]
    fn token_count_untouched_without_metering(steps in proptest::collection::vec(arb_step(), 0..16)) {
        let state = run(&steps, &test_context());
        prop_assert_eq!(state.token_count(), 0);
    }

    #[test]
    fn metered_token_count_sums_successful_replies(steps in proptest::collection::vec(arb_step(), 0..16)) {
        let context = test_context().with_metering(true);
        let state = run(&steps, &context);
        let expected: u64 = steps
            .iter()
            .map(|s| match s {
                Step::Reply { tokens, .. } => *tokens,
                _ => 0,
            })
            .sum();
        prop_assert_eq!(state.token_count(), expected);
    }

    #[test]
    fn transition_effects_never_orphan_a_reply(phase in arb_phase(), event in arb_event()) {
        if let Ok(result) = transition(&phase, &test_context(), event) {
            let appended: Vec<Message> = result
                .effects
                .into_iter()
                .filter_map(|e| match e {
                    Effect::AppendMessage(m) => Some(m),
                    _ => None,
                })
                .collect();
            prop_assert!(!has_orphaned_reply(&appended));
            prop_assert!(appended.len() <= 2);
        }
    }

    #[test]
    fn rejected_transitions_name_the_reason(phase in arb_phase(), event in arb_event()) {
        let busy = !phase.is_idle() && matches!(event, Event::Submit { .. });
        let stray = phase.is_idle() && !matches!(event, Event::Submit { .. });
        match transition(&phase, &test_context(), event) {
            Ok(_) => prop_assert!(!busy && !stray),
            Err(TransitionError::SessionBusy) => prop_assert!(busy),
            Err(TransitionError::InvalidTransition(_)) => prop_assert!(stray),
        }
    }

    #[test]
    fn independent_sessions_do_not_interfere(
        a_steps in proptest::collection::vec(arb_step(), 0..10),
        b_steps in proptest::collection::vec(arb_step(), 0..10),
    ) {
        let context = test_context();
        let a_alone = run(&a_steps, &context);

        let mut a = SessionState::new();
        let mut b = SessionState::new();
        for s in &b_steps {
            if let Step::Stage(text) = s {
                b.stage_input(text.clone());
            }
        }
        for s in &a_steps {
            match s.clone() {
                Step::Stage(text) => a.stage_input(text),
                Step::Reply { text, tokens } => {
                    submit(&mut a, Event::ReplyReceived { text, tokens_used: tokens }, &context).unwrap();
                }
                Step::Fail { kind, message } => {
                    submit(&mut a, Event::ReplyFailed { kind, message }, &context).unwrap();
                }
            }
        }

        prop_assert_eq!(a.history(), a_alone.history());
        prop_assert_eq!(a.pending_input(), a_alone.pending_input());
        let b_stage_count = b_steps.iter().filter(|s| matches!(s, Step::Stage(_))).count();
        prop_assert!(b.history().is_empty());
        if b_stage_count == 0 {
            prop_assert!(b.pending_input().is_empty());
        }
    }
}

#[test]
fn scenario_two_consecutive_submissions() {
    let context = test_context();
    let state = run(
        &[
            Step::Stage("first".to_string()),
            Step::Reply {
                text: "one".to_string(),
                tokens: 1,
            },
            Step::Stage("second".to_string()),
            Step::Reply {
                text: "two".to_string(),
                tokens: 1,
            },
        ],
        &context,
    );

    assert_eq!(
        state.history(),
        &[
            Message::human("first"),
            Message::ai("one"),
            Message::human("second"),
            Message::ai("two"),
        ]
    );
}
