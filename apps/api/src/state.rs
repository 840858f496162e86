use std::sync::Arc;

use crate::llm_client::GenerationClient;
use crate::session::SessionGate;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Gemini in production; swapped for a scripted client in tests.
    pub llm: Arc<dyn GenerationClient>,
    pub sessions: Arc<SessionGate>,
}
