use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::routes::envelope;
use crate::state::AppState;

/// GET /health
/// Liveness plus which backend is answering (if initialized yet).
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let info = state.service.info();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "joblens-matcher",
        "model_initialized": info.initialized,
        "regression_enabled": state.config.regression_enabled,
        "backend": info.backend,
    }))
}

/// GET /model-info
pub async fn model_info_handler(State(state): State<AppState>) -> Json<Value> {
    envelope(state.service.info())
}
