//! Research Chat - single-page chat with a research assistant persona
//!
//! Each browser session holds its own conversation; every submitted turn
//! goes to the remote model and the reply is appended to that session's
//! history.

mod api;
mod config;
mod gateway;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;

use api::{create_router, AppState, PageRenderer};
use config::ChatConfig;
use gateway::LlmGateway;
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle sessions are swept
const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env()?;
    let system_prompt = system_prompt::load_system_prompt(config.system_prompt_file.as_deref())?;

    // Completion gateway
    let llm = llm::build_service(&config.llm)?;
    let gateway = LlmGateway::new(llm, system_prompt);
    let model_id = gateway.model_id().to_string();

    if config.llm.has_api_key() {
        tracing::info!(
            model = %model_id,
            base_url = %config.llm.base_url,
            meter_tokens = config.meter_tokens,
            "Completion gateway initialized"
        );
    } else {
        tracing::warn!("GEMINI_API_KEY is not set; every submission will fail with an auth error");
    }

    // Create application state
    let sessions = Arc::new(
        SessionManager::new(Arc::new(gateway), config.meter_tokens)
            .with_idle_timeout(config.session_idle),
    );
    runtime::spawn_idle_sweeper(&sessions, SESSION_SWEEP_PERIOD.min(config.session_idle));
    let state = AppState::new(sessions, PageRenderer::new()?, &model_id);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Research chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
