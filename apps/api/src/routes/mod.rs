pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Raw body limit as a multiple of the file limit. The handler enforces the
/// file limit itself while streaming; this only caps abusive bodies.
const BODY_LIMIT_FACTOR: usize = 2;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes * BODY_LIMIT_FACTOR;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/api/health", get(health::health_handler))
        .route("/api/analyze", post(handlers::handle_analyze))
        .route("/api/analyze/text", post(handlers::handle_analyze_text))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
