//! ModelService — owns the active scoring backend.
//!
//! Initialization chain (runs once, on first use or via `initialize`):
//!   1. regression disabled           → fallback
//!   2. artifact on disk loads         → regression (Loaded)
//!   3. otherwise train from the corpus, save, use it (Trained)
//!   4. no corpus / training failure   → fallback with the reason
//!
//! Predictions clone the active `Arc<Backend>` under a read lock and score
//! without holding it. Retrain and reload build the replacement first and
//! swap it in with one write.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::MatchError;
use crate::models::{MatchRequest, MatchResult};
use crate::scoring::{BackendKind, FallbackMatcher, MatchModel, MatchScorer};
use crate::text::{Lexicon, SkillExtractor};
use crate::training::{find_dataset, load_corpus, train, TrainingConfig, TrainingMetrics};

/// Where the service finds its artifact and corpus, and how it trains.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub model_path: PathBuf,
    pub dataset_paths: Vec<PathBuf>,
    pub regression_enabled: bool,
    /// Read at most this many corpus rows.
    pub read_rows: Option<usize>,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    RegressionDisabled,
    DatasetMissing,
    ArtifactCorruptRetrainFailed(String),
    TrainingFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::RegressionDisabled => write!(f, "regression backend disabled"),
            FallbackReason::DatasetMissing => write!(f, "no job corpus found for training"),
            FallbackReason::ArtifactCorruptRetrainFailed(e) => {
                write!(f, "stored model unusable and retraining failed: {e}")
            }
            FallbackReason::TrainingFailed(e) => write!(f, "training failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    Loaded,
    Trained(TrainingMetrics),
    Fallback(FallbackReason),
}

#[derive(Debug)]
enum Backend {
    Regression(MatchModel),
    Fallback {
        matcher: FallbackMatcher,
        reason: FallbackReason,
    },
}

impl Backend {
    fn scorer(&self) -> &dyn MatchScorer {
        match self {
            Backend::Regression(model) => model,
            Backend::Fallback { matcher, .. } => matcher,
        }
    }
}

/// Snapshot of the active backend and the artifact file, for `/model-info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub initialized: bool,
    pub backend: Option<BackendKind>,
    pub fallback_reason: Option<String>,
    pub model_path: String,
    pub model_exists: bool,
    pub model_size_mb: Option<f64>,
    pub model_modified: Option<DateTime<Utc>>,
    pub artifact_id: Option<Uuid>,
    pub trained_at: Option<DateTime<Utc>>,
    pub vocabulary_size: Option<usize>,
    pub metrics: Option<TrainingMetrics>,
}

pub struct ModelService {
    settings: ServiceSettings,
    lexicon: Arc<Lexicon>,
    active: RwLock<Option<Arc<Backend>>>,
    outcome: RwLock<Option<InitOutcome>>,
    /// Serializes initialization, retraining and reloading.
    rebuild: Mutex<()>,
}

impl ModelService {
    pub fn new(settings: ServiceSettings, lexicon: Arc<Lexicon>) -> Self {
        Self {
            settings,
            lexicon,
            active: RwLock::new(None),
            outcome: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Runs the initialization chain once; later calls return the first outcome.
    pub fn initialize(&self) -> InitOutcome {
        let _guard = self.rebuild.lock();
        if let Some(outcome) = self.outcome.read().clone() {
            return outcome;
        }

        let (backend, outcome) = self.build_initial_backend();
        match &outcome {
            InitOutcome::Loaded => info!("Model service ready: loaded stored model"),
            InitOutcome::Trained(m) => {
                info!(test_r2 = m.test_r2, "Model service ready: trained new model")
            }
            InitOutcome::Fallback(reason) => {
                warn!(%reason, "Model service ready: using fallback matcher")
            }
        }
        *self.active.write() = Some(Arc::new(backend));
        *self.outcome.write() = Some(outcome.clone());
        outcome
    }

    /// Scores with the backend active at call time and reports which one it was.
    pub fn predict(&self, request: &MatchRequest) -> (MatchResult, BackendKind) {
        let backend = self.backend();
        let scorer = backend.scorer();
        (scorer.predict_match(request), scorer.kind())
    }

    /// Skill extraction needs only the lexicon, never a model.
    pub fn extract_skills(&self, text: &str) -> BTreeSet<String> {
        SkillExtractor::new(Arc::clone(&self.lexicon)).extract(text)
    }

    /// Trains a fresh model from the corpus, saves it, then swaps it in.
    /// On any failure the current backend stays active.
    pub fn retrain(&self) -> Result<TrainingMetrics, MatchError> {
        if !self.settings.regression_enabled {
            return Err(MatchError::RegressionUnavailable(
                "regression backend is disabled".into(),
            ));
        }
        let _guard = self.rebuild.lock();

        let (model, metrics) = self.train_from_corpus()?;
        model.save(&self.settings.model_path)?;
        self.swap(Backend::Regression(model), InitOutcome::Trained(metrics.clone()));
        info!(test_r2 = metrics.test_r2, "Retrained model is now active");
        Ok(metrics)
    }

    /// Replaces the active backend with the artifact currently on disk.
    /// On failure the current backend stays active.
    pub fn reload(&self) -> Result<(), MatchError> {
        if !self.settings.regression_enabled {
            return Err(MatchError::RegressionUnavailable(
                "regression backend is disabled".into(),
            ));
        }
        let _guard = self.rebuild.lock();
        let model = MatchModel::load(&self.settings.model_path, Arc::clone(&self.lexicon))?;
        self.swap(Backend::Regression(model), InitOutcome::Loaded);
        info!(path = %self.settings.model_path.display(), "Reloaded stored model");
        Ok(())
    }

    pub fn info(&self) -> ModelInfo {
        let backend = self.active.read().clone();
        let path = &self.settings.model_path;
        let metadata = std::fs::metadata(path).ok().filter(|m| m.is_file());

        let mut info = ModelInfo {
            initialized: backend.is_some(),
            backend: backend.as_ref().map(|b| b.scorer().kind()),
            fallback_reason: None,
            model_path: path.display().to_string(),
            model_exists: metadata.is_some(),
            model_size_mb: metadata
                .as_ref()
                .map(|m| (m.len() as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0),
            model_modified: metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
            artifact_id: None,
            trained_at: None,
            vocabulary_size: None,
            metrics: None,
        };
        match backend.as_deref() {
            Some(Backend::Regression(model)) => {
                info.artifact_id = Some(model.provenance().artifact_id);
                info.trained_at = Some(model.provenance().created_at);
                info.vocabulary_size = Some(model.vocabulary_len());
                info.metrics = Some(model.metrics().clone());
            }
            Some(Backend::Fallback { reason, .. }) => {
                info.fallback_reason = Some(reason.to_string());
            }
            None => {}
        }
        info
    }

    // ────────────────────────────────────────────────────────────────────────

    fn backend(&self) -> Arc<Backend> {
        if let Some(backend) = self.active.read().as_ref() {
            return Arc::clone(backend);
        }
        self.initialize();
        match self.active.read().as_ref() {
            Some(backend) => Arc::clone(backend),
            None => Arc::new(self.fallback(FallbackReason::TrainingFailed(
                "initialization produced no backend".into(),
            ))),
        }
    }

    fn swap(&self, backend: Backend, outcome: InitOutcome) {
        *self.active.write() = Some(Arc::new(backend));
        *self.outcome.write() = Some(outcome);
    }

    fn fallback(&self, reason: FallbackReason) -> Backend {
        Backend::Fallback {
            matcher: FallbackMatcher::new(Arc::clone(&self.lexicon)),
            reason,
        }
    }

    fn build_initial_backend(&self) -> (Backend, InitOutcome) {
        if !self.settings.regression_enabled {
            let reason = FallbackReason::RegressionDisabled;
            return (self.fallback(reason.clone()), InitOutcome::Fallback(reason));
        }

        let path = &self.settings.model_path;
        let stored_model_failed = if path.exists() {
            match MatchModel::load(path, Arc::clone(&self.lexicon)) {
                Ok(model) => return (Backend::Regression(model), InitOutcome::Loaded),
                Err(e) => {
                    warn!(error = %e, "Stored model unusable, retraining");
                    true
                }
            }
        } else {
            info!(path = %path.display(), "No stored model, training a new one");
            false
        };

        match self.train_from_corpus() {
            Ok((model, metrics)) => {
                if let Err(e) = model.save(path) {
                    error!(error = %e, "Trained model could not be saved, keeping it in memory");
                }
                (Backend::Regression(model), InitOutcome::Trained(metrics))
            }
            Err(e) => {
                let reason = if stored_model_failed {
                    FallbackReason::ArtifactCorruptRetrainFailed(e.to_string())
                } else if matches!(e, MatchError::MissingDataset { .. }) {
                    FallbackReason::DatasetMissing
                } else {
                    FallbackReason::TrainingFailed(e.to_string())
                };
                (self.fallback(reason.clone()), InitOutcome::Fallback(reason))
            }
        }
    }

    fn train_from_corpus(&self) -> Result<(MatchModel, TrainingMetrics), MatchError> {
        let dataset = find_dataset(&self.settings.dataset_paths)?;
        let jobs = load_corpus(&dataset, self.settings.read_rows)?;
        train(&jobs, &self.settings.training, Arc::clone(&self.lexicon))
    }
}
