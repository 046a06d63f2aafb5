//! Scoring backends and the service that owns the active one.
//!
//! Both backends implement [`MatchScorer`] and return the same `MatchResult`
//! shape, so callers never need to know which one answered.

pub mod artifact;
pub mod fallback;
pub mod recommend;
pub mod regressor;
pub mod service;

use serde::Serialize;

use crate::models::{MatchRequest, MatchResult};

pub use fallback::FallbackMatcher;
pub use regressor::{MatchModel, MatchPolicy};
pub use service::{InitOutcome, ModelService, ServiceSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Regression,
    Fallback,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Regression => "regression",
            BackendKind::Fallback => "fallback",
        }
    }
}

/// A scorer for (user, job) pairs. Infallible: internal failures degrade to a
/// simpler score instead of surfacing to the caller.
pub trait MatchScorer: Send + Sync {
    fn predict_match(&self, request: &MatchRequest) -> MatchResult;

    fn kind(&self) -> BackendKind;
}
