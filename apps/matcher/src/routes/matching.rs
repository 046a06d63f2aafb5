//! Prediction, training and skill-extraction endpoints.
//!
//! Model work is CPU-bound (TF-IDF, forest traversal, full retraining), so every
//! handler moves it onto the blocking pool with `tokio::task::spawn_blocking`.

use std::collections::BTreeSet;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::models::MatchRequest;
use crate::routes::envelope;
use crate::scoring::service::ModelInfo;
use crate::scoring::BackendKind;
use crate::state::AppState;
use crate::training::TrainingMetrics;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub job_requirements: Option<String>,
    #[serde(default)]
    pub job_responsibilities: Option<String>,
    #[serde(default)]
    pub user_skills: Vec<String>,
    #[serde(default)]
    pub user_experience: f64,
    /// Used to extract skills when `user_skills` is empty.
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub match_score: f64,
    pub required_skills: BTreeSet<String>,
    pub resume_skills: BTreeSet<String>,
    pub skill_overlap: usize,
    pub missing_skills: BTreeSet<String>,
    pub experience_match: f64,
    pub recommendations: String,
    pub backend: BackendKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub message: &'static str,
    pub metrics: TrainingMetrics,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub message: &'static str,
    pub model: ModelInfo,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub skills: BTreeSet<String>,
    pub count: usize,
}

/// POST /predict
pub async fn predict_handler(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Value>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description is required".into()));
    }

    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || {
        let mut user_skills = req.user_skills;
        if user_skills.iter().all(|s| s.trim().is_empty()) {
            user_skills = req
                .resume_text
                .as_deref()
                .map(|text| service.extract_skills(text).into_iter().collect())
                .unwrap_or_default();
        }
        if user_skills.is_empty() {
            return Err(AppError::Validation(
                "user_skills is required or resume_text must contain extractable skills".into(),
            ));
        }

        let request = MatchRequest {
            user_skills,
            user_experience: req.user_experience,
            job_description: req.job_description,
            job_requirements: req.job_requirements,
            job_responsibilities: req.job_responsibilities,
        };
        let (result, backend) = service.predict(&request);
        Ok(PredictResponse {
            match_score: result.match_score,
            required_skills: result.job_skills,
            resume_skills: result.user_skills,
            skill_overlap: result.skill_overlap,
            missing_skills: result.missing_skills,
            experience_match: result.experience_match,
            recommendations: result.recommendations,
            backend,
            timestamp: Utc::now(),
        })
    })
    .await
    .map_err(anyhow::Error::from)??;

    info!(
        score = response.match_score,
        backend = response.backend.as_str(),
        "Prediction served"
    );
    Ok(envelope(response))
}

/// POST /train and POST /retrain
pub async fn train_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let service = state.service.clone();
    let metrics = tokio::task::spawn_blocking(move || service.retrain())
        .await
        .map_err(anyhow::Error::from)??;

    Ok(envelope(TrainResponse {
        message: "Model trained successfully",
        metrics,
        timestamp: Utc::now(),
    }))
}

/// POST /reload
/// Swaps in the artifact currently on disk without retraining.
pub async fn reload_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let service = state.service.clone();
    let model = tokio::task::spawn_blocking(move || {
        service.reload()?;
        Ok::<_, AppError>(service.info())
    })
    .await
    .map_err(anyhow::Error::from)??;

    Ok(envelope(ReloadResponse {
        message: "Model reloaded successfully",
        model,
        timestamp: Utc::now(),
    }))
}

/// POST /skills/extract
pub async fn extract_skills_handler(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<Value>, AppError> {
    let text = req
        .text
        .ok_or_else(|| AppError::Validation("Text field is required".into()))?;

    let service = state.service.clone();
    let skills = tokio::task::spawn_blocking(move || service.extract_skills(&text))
        .await
        .map_err(anyhow::Error::from)?;

    Ok(envelope(ExtractResponse {
        count: skills.len(),
        skills,
    }))
}
