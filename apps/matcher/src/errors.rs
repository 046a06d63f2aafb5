use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the matching core (corpus, training, artifact, inference).
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Job corpus not found (tried: {})", display_paths(.tried))]
    MissingDataset { tried: Vec<PathBuf> },

    #[error("Dataset missing required columns: {}", .missing.join(", "))]
    SchemaValidation { missing: Vec<String> },

    #[error("Failed to read job corpus {path}: {source}")]
    Corpus {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Job corpus contains no usable rows")]
    EmptyCorpus,

    #[error("Invalid training configuration: {0}")]
    InvalidTrainingConfig(String),

    #[error("Failed to load model artifact {path}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    #[error("Failed to save model artifact {path}: {reason}")]
    ArtifactSave { path: PathBuf, reason: String },

    #[error("Feature mismatch: expected {expected} columns, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Regression backend unavailable: {0}")]
    RegressionUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(#[from] MatchError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Model(e) => {
                tracing::error!("Model error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MODEL_ERROR",
                    e.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "data": null,
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
