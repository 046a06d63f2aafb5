pub mod health;
pub mod matching;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// Success body: `{"success": true, "error": null, "data": ...}`.
pub fn envelope<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "error": null,
        "data": data,
    }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/model-info", get(health::model_info_handler))
        .route("/predict", post(matching::predict_handler))
        .route("/train", post(matching::train_handler))
        .route("/retrain", post(matching::train_handler))
        .route("/reload", post(matching::reload_handler))
        .route("/skills/extract", post(matching::extract_skills_handler))
        .with_state(state)
}
