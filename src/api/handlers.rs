//! HTTP request handlers
//!
//! Sessions are keyed by the `chat_session` cookie; a request without a
//! known cookie gets a fresh session and the cookie is (re)issued on every
//! response.

use super::assets::serve_static;
use super::page::PageView;
use super::types::{
    ChatForm, ErrorResponse, ModelInfo, StageInputRequest, SubmitResponse, SuccessResponse,
};
use super::AppState;
use crate::gateway::GatewayErrorKind;
use crate::runtime::{submit_detached, SessionHandle, SessionSnapshot, SubmitError};
use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;

const SESSION_COOKIE: &str = "chat_session";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page
        .route("/", get(index))
        .route("/chat", post(chat_form))
        .route("/reset", post(reset))
        // Static assets
        .route("/assets/*path", get(serve_static))
        // JSON API over the same session
        .route("/api/session", get(get_session).delete(end_session))
        .route("/api/session/input", put(stage_input))
        .route("/api/session/submit", post(submit))
        .route("/api/model", get(get_model))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session helpers
// ============================================================

fn requested_session(cookie: Option<&TypedHeader<Cookie>>) -> Option<&str> {
    cookie.and_then(|TypedHeader(c)| c.get(SESSION_COOKIE))
}

async fn resolve_session(
    state: &AppState,
    cookie: Option<&TypedHeader<Cookie>>,
) -> (String, SessionHandle) {
    let (id, handle, created) = state
        .sessions
        .get_or_create(requested_session(cookie))
        .await;
    if created {
        tracing::debug!(session_id = %id, "Issued session cookie");
    }
    (id, handle)
}

fn session_cookie(id: &str) -> [(HeaderName, String); 1] {
    [(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"),
    )]
}

async fn snapshot(handle: &SessionHandle) -> SessionSnapshot {
    SessionSnapshot::of(&*handle.lock().await)
}

// ============================================================
// Chat page
// ============================================================

async fn index(State(state): State<AppState>, cookie: Option<TypedHeader<Cookie>>) -> Response {
    let (id, handle) = resolve_session(&state, cookie.as_ref()).await;
    let snapshot = snapshot(&handle).await;

    match state.pages.render(&PageView::new(&snapshot, &state.model_id)) {
        Ok(html) => (session_cookie(&id), Html(html)).into_response(),
        Err(e) => AppError::Internal(format!("Failed to render page: {e}")).into_response(),
    }
}

/// Stage and submit in one step, then show the page again. A failed turn
/// is recorded on the session, so the page reports it.
async fn chat_form(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
    Form(form): Form<ChatForm>,
) -> Response {
    let (id, handle) = resolve_session(&state, cookie.as_ref()).await;

    if let Err(e) = submit_detached(handle, Some(form.human_prompt)).await {
        tracing::debug!(session_id = %id, error = %e, "Chat form submission failed");
    }

    (session_cookie(&id), Redirect::to("/")).into_response()
}

async fn reset(State(state): State<AppState>, cookie: Option<TypedHeader<Cookie>>) -> Redirect {
    if let Some(id) = requested_session(cookie.as_ref()) {
        state.sessions.end(id).await;
    }
    Redirect::to("/")
}

// ============================================================
// JSON API
// ============================================================

async fn get_session(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Response {
    let (id, handle) = resolve_session(&state, cookie.as_ref()).await;
    (session_cookie(&id), Json(snapshot(&handle).await)).into_response()
}

async fn stage_input(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
    Json(req): Json<StageInputRequest>,
) -> Response {
    let (id, handle) = resolve_session(&state, cookie.as_ref()).await;
    let snapshot = {
        let mut session = handle.lock().await;
        session.stage_input(req.text);
        SessionSnapshot::of(&session)
    };
    (session_cookie(&id), Json(snapshot)).into_response()
}

async fn submit(State(state): State<AppState>, cookie: Option<TypedHeader<Cookie>>) -> Response {
    let (id, handle) = resolve_session(&state, cookie.as_ref()).await;

    match submit_detached(handle.clone(), None).await {
        Ok(reply) => {
            let session = snapshot(&handle).await;
            (session_cookie(&id), Json(SubmitResponse { reply, session })).into_response()
        }
        Err(e) => (session_cookie(&id), AppError::from(e)).into_response(),
    }
}

async fn end_session(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Json<SuccessResponse> {
    let success = match requested_session(cookie.as_ref()) {
        Some(id) => state.sessions.end(id).await,
        None => false,
    };
    Json(SuccessResponse { success })
}

async fn get_model(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(ModelInfo {
        id: state.model_id.to_string(),
    })
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Conflict(String),
    BadGateway(GatewayErrorKind, String),
    Internal(String),
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Rejected(e) => AppError::Conflict(e.to_string()),
            SubmitError::Gateway(e) => AppError::BadGateway(e.kind(), e.to_string()),
            SubmitError::Aborted(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new(msg)),
            AppError::BadGateway(kind, msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new(msg).with_kind(kind),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}
