use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::export::PdfExporter;
use crate::llm_client::LlmClient;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pluggable persistence. Postgres in production, in-memory in tests.
    pub store: Arc<dyn ResumeStore>,
    pub llm: LlmClient,
    pub exporter: Arc<PdfExporter>,
    pub config: Config,
}
