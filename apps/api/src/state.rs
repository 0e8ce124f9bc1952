use std::sync::Arc;

use crate::ranking::scorer::ResumeScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable resume scorer. Default: `LlmResumeScorer` over the
    /// completion client; tests substitute a stub.
    pub scorer: Arc<dyn ResumeScorer>,
}
