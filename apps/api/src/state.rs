use std::sync::Arc;

use crate::analysis::ResumeAnalyzer;
use crate::config::Config;
use crate::extraction::DocumentExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup; read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub extractor: Arc<DocumentExtractor>,
    /// Owns the LLM backend. Tests swap in a scripted one.
    pub analyzer: Arc<ResumeAnalyzer>,
}
