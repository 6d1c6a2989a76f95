//! Chat page rendering
//!
//! A pure function from a session snapshot to HTML. The template is
//! auto-escaped, so message text can never inject markup.

use crate::runtime::SessionSnapshot;
use crate::state_machine::{Message, TurnFailure};
use minijinja::Environment;
use serde::Serialize;

const INDEX_TEMPLATE: &str = include_str!("../../ui/templates/index.html");

pub const PAGE_TITLE: &str = "Research Chatbot 🤖";
pub const DEFAULT_PROMPT: &str = "Hello bot";
/// No summarizing memory is wired to the session; the debug line says so.
const NO_MEMORY: &str = "No conversation yet.";

/// Everything the page template needs
#[derive(Debug, Serialize)]
pub struct PageView<'a> {
    title: &'static str,
    model: &'a str,
    messages: &'a [Message],
    input_value: &'a str,
    placeholder: &'static str,
    token_count: u64,
    memory_debug: &'static str,
    failure: Option<&'a TurnFailure>,
}

impl<'a> PageView<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, model: &'a str) -> Self {
        // A fresh session starts with the greeting prefilled.
        let input_value = if snapshot.history.is_empty() && snapshot.pending_input.is_empty() {
            DEFAULT_PROMPT
        } else {
            snapshot.pending_input.as_str()
        };

        Self {
            title: PAGE_TITLE,
            model,
            messages: &snapshot.history,
            input_value,
            placeholder: DEFAULT_PROMPT,
            token_count: snapshot.token_count,
            memory_debug: NO_MEMORY,
            failure: snapshot.last_error.as_ref(),
        }
    }
}

/// Holds the compiled page template
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView<'_>) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(view)
    }
}
