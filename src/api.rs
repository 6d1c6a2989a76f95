//! HTTP surface for the chat
//!
//! Serves the chat page, a small JSON API over the same session
//! operations, and the embedded static assets.

mod assets;
mod handlers;
mod page;
mod types;

pub use handlers::create_router;
pub use page::PageRenderer;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub pages: Arc<PageRenderer>,
    pub model_id: Arc<str>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, pages: PageRenderer, model_id: &str) -> Self {
        Self {
            sessions,
            pages: Arc::new(pages),
            model_id: Arc::from(model_id),
        }
    }
}
