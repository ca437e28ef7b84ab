use std::sync::Arc;

use crate::config::Config;
use crate::db::Db;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Text-generation provider. Production: `LlmClient`; tests swap in a scripted stub.
    pub generator: Arc<dyn TextGenerator>,
    pub config: Config,
}
