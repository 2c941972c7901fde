use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::scheduling::calendar::CalendarClient;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Swappable model seam — the production `LlmClient`, or a scripted
    /// double in tests.
    pub llm: Arc<dyn ChatModel>,
    /// Owns every conversation session; handlers and the orchestrator only
    /// ever work through it.
    pub sessions: Arc<SessionStore>,
    pub calendar: Arc<CalendarClient>,
    /// Resume content, loaded once at startup.
    pub resume_text: Arc<String>,
    pub config: Config,
}
