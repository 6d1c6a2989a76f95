//! Runtime for chat sessions
//!
//! Each session's state is private to it and held behind its own lock;
//! the manager only maps session ids to sessions.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{ChatSession, SubmitError};

use crate::gateway::CompletionGateway;
use crate::state_machine::{Message, SessionContext, SessionPhase, TurnFailure};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<ChatSession>>;

/// Read-only view of a session, the input to rendering
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub history: Vec<Message>,
    pub pending_input: String,
    pub token_count: u64,
    pub phase: SessionPhase,
    pub last_error: Option<TurnFailure>,
    pub started_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn of(session: &ChatSession) -> Self {
        let state = session.state();
        Self {
            session_id: session.id().to_string(),
            history: state.history().to_vec(),
            pending_input: state.pending_input().to_string(),
            token_count: state.token_count(),
            phase: state.phase().clone(),
            last_error: state.last_error().cloned(),
            started_at: state.started_at(),
        }
    }
}

/// Sessions idle longer than this are dropped
pub const DEFAULT_SESSION_IDLE: Duration =
    Duration::from_secs(crate::config::DEFAULT_SESSION_IDLE_SECS);

struct TrackedSession {
    handle: SessionHandle,
    last_active: Instant,
}

/// Manager for all live sessions
pub struct SessionManager {
    gateway: Arc<dyn CompletionGateway>,
    meter_tokens: bool,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<String, TrackedSession>>,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn CompletionGateway>, meter_tokens: bool) -> Self {
        Self {
            gateway,
            meter_tokens,
            idle_timeout: DEFAULT_SESSION_IDLE,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Start a new session and return its id. Idle sessions are swept
    /// first, so the map only grows with sessions still in use.
    pub async fn create(&self) -> (String, SessionHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(&id).with_metering(self.meter_tokens);
        let handle = Arc::new(Mutex::new(ChatSession::new(context, self.gateway.clone())));

        let mut sessions = self.sessions.write().await;
        let evicted = Self::sweep(&mut sessions, self.idle_timeout);
        sessions.insert(
            id.clone(),
            TrackedSession {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::info!(
            session_id = %id,
            live = sessions.len(),
            evicted,
            "Session started"
        );
        (id, handle)
    }

    /// Look up a live session, marking it active.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let tracked = sessions.get_mut(id)?;
        if tracked.last_active.elapsed() >= self.idle_timeout && tracked.handle.try_lock().is_ok() {
            sessions.remove(id);
            tracing::info!(session_id = %id, "Session expired");
            return None;
        }
        tracked.last_active = Instant::now();
        Some(tracked.handle.clone())
    }

    /// Look up `id`, or start a fresh session when it is absent or unknown.
    /// The flag reports whether a new session was created.
    pub async fn get_or_create(&self, id: Option<&str>) -> (String, SessionHandle, bool) {
        if let Some(id) = id {
            if let Some(handle) = self.get(id).await {
                return (id.to_string(), handle, false);
            }
        }
        let (id, handle) = self.create().await;
        (id, handle, true)
    }

    /// Discard a session's state. Returns whether it existed.
    pub async fn end(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session ended");
        }
        removed
    }

    /// Drop every session idle past the timeout. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let evicted = Self::sweep(&mut *self.sessions.write().await, self.idle_timeout);
        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    /// Sessions mid-submission hold their lock and are never swept.
    fn sweep(sessions: &mut HashMap<String, TrackedSession>, idle_timeout: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|_, tracked| {
            tracked.last_active.elapsed() < idle_timeout || tracked.handle.try_lock().is_err()
        });
        before - sessions.len()
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Periodically evict idle sessions for as long as the manager is alive.
pub fn spawn_idle_sweeper(sessions: &Arc<SessionManager>, period: Duration) {
    let sessions = Arc::downgrade(sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(sessions) = sessions.upgrade() else {
                break;
            };
            sessions.evict_idle().await;
        }
    });
}

/// Submit the session's staged input (after staging `text`, if given),
/// running to completion even if the caller stops waiting. The session
/// stays locked for the whole exchange.
///
/// If the task dies mid-exchange the turn is recorded as failed, so the
/// session is idle again for the next submission.
pub async fn submit_detached(
    handle: SessionHandle,
    text: Option<String>,
) -> Result<String, SubmitError> {
    let task_handle = handle.clone();
    let outcome = tokio::spawn(async move {
        let mut session = task_handle.lock().await;
        if let Some(text) = text {
            session.stage_input(text);
        }
        session.submit().await
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(e) => {
            let reason = e.to_string();
            handle.lock().await.abandon_pending(&reason);
            Err(SubmitError::Aborted(reason))
        }
    }
}
