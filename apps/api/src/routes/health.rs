use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cv-api"
    }))
}

/// GET /
/// Service metadata and entry points.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "cv-api is running",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/health",
        "analyze": "/api/analyze",
        "analyze_text": "/api/analyze/text"
    }))
}
