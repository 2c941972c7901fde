mod config;
mod dialogue;
mod errors;
mod llm_client;
mod resume;
mod routes;
mod scheduling;
mod security;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatModel, LlmClient};
use crate::resume::load_resume;
use crate::routes::build_router;
use crate::scheduling::calendar::CalendarClient;
use crate::session::SessionStore;
use crate::state::AppState;

/// How often the background sweep evicts idle sessions.
const SESSION_SWEEP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dossier API v{}", env!("CARGO_PKG_VERSION"));

    // Load resume once at startup
    let resume_text = Arc::new(load_resume(&config.resume_path));
    info!("Resume loaded ({} bytes)", resume_text.len());

    // Session store + periodic expiry sweep
    let sessions = Arc::new(SessionStore::new(chrono::Duration::seconds(
        config.session_timeout_secs,
    )));
    spawn_session_sweep(Arc::clone(&sessions));

    // LLM client
    let llm: Arc<dyn ChatModel> = Arc::new(LlmClient::new(config.openai_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Calendar client (scheduling degrades gracefully without credentials)
    let calendar = Arc::new(CalendarClient::new(&config));
    info!("Calendar client initialized");

    let state = AppState {
        llm,
        sessions,
        calendar,
        resume_text,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Evicts expired sessions in the background. Expiry is also checked lazily
/// on every access; the sweep just keeps abandoned sessions from lingering.
fn spawn_session_sweep(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                info!("Session sweep evicted {removed} expired sessions");
            }
        }
    });
}
