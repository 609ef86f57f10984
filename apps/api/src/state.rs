use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::search::CandidateSearch;

/// Shared application state injected into all route handlers via Axum extractors.
/// Both capabilities are trait objects so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<dyn CandidateSearch>,
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
}
