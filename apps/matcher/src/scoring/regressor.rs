//! Trained regression scorer.
//!
//! Inference rebuilds the training feature layout for an ad-hoc job: the
//! numeric columns go through the fitted scaler, the canonical job text
//! through the fitted TF-IDF vocabulary, and the forest produces the score.
//! Anything that prevents a clean forest prediction degrades to
//! `skill_ratio × 100` for that request only.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::features::{experience_match, skill_match, FeatureAssembler, JobEncoders};
use crate::models::match_result::finalize_score;
use crate::models::{MatchRequest, MatchResult, UserProfile};
use crate::scoring::recommend::score_recommendation;
use crate::scoring::{BackendKind, MatchScorer};
use crate::text::{SkillExtractor, TextPreprocessor};
use crate::training::forest::RandomForest;
use crate::training::matrix::FeatureRow;
use crate::training::metrics::TrainingMetrics;
use crate::training::scaler::StandardScaler;
use crate::training::vectorizer::TfidfVectorizer;

/// Inference-time assumptions for jobs that arrive without corpus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Required years assumed for an ad-hoc job.
    pub experience_baseline_years: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            experience_baseline_years: 3.0,
        }
    }
}

impl MatchPolicy {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(self.experience_baseline_years.is_finite() && self.experience_baseline_years > 0.0) {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "experience baseline {} must be a positive number of years",
                self.experience_baseline_years
            )));
        }
        Ok(())
    }
}

/// Where a model came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProvenance {
    pub artifact_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub corpus_rows: usize,
    pub interactions: usize,
    pub seed: Option<u64>,
}

/// A fitted scoring pipeline. Built by `training::train` or loaded from a
/// `ModelArtifact`; never partially initialized.
#[derive(Debug)]
pub struct MatchModel {
    pub(crate) preprocessor: TextPreprocessor,
    pub(crate) extractor: SkillExtractor,
    pub(crate) encoders: JobEncoders,
    pub(crate) vectorizer: TfidfVectorizer,
    pub(crate) scaler: StandardScaler,
    pub(crate) forest: RandomForest,
    pub(crate) policy: MatchPolicy,
    pub(crate) provenance: ModelProvenance,
    pub(crate) metrics: TrainingMetrics,
}

impl MatchModel {
    pub fn provenance(&self) -> &ModelProvenance {
        &self.provenance
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    /// Raw forest output for one request.
    fn forest_score(
        &self,
        user: &UserProfile,
        job_skills: &BTreeSet<String>,
        job_text: &str,
    ) -> Result<f64, MatchError> {
        let numeric = FeatureAssembler::adhoc_features(
            user,
            job_skills,
            &self.encoders,
            self.policy.experience_baseline_years,
        )
        .to_row();
        let scaled = self.scaler.transform(&numeric)?;
        let text = self
            .vectorizer
            .transform(&self.preprocessor.canonical_text(job_text));

        let width = scaled.len() + self.vectorizer.vocabulary_len();
        if width != self.forest.n_features() {
            return Err(MatchError::FeatureMismatch {
                expected: self.forest.n_features(),
                actual: width,
            });
        }

        let raw = self.forest.predict(&FeatureRow {
            numeric: scaled,
            text,
        });
        if !raw.is_finite() {
            return Err(MatchError::RegressionUnavailable(format!(
                "forest produced non-finite score {raw}"
            )));
        }
        Ok(raw)
    }
}

impl MatchScorer for MatchModel {
    fn predict_match(&self, request: &MatchRequest) -> MatchResult {
        let user = UserProfile::new(&request.user_skills, request.user_experience);
        let job_text = request.combined_job_text();
        let job_skills = self.extractor.extract(&job_text);
        let matched = skill_match(&user.skills, &job_skills);

        let score = match self.forest_score(&user, &job_skills, &job_text) {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "Regression prediction failed, using skill ratio");
                matched.ratio * 100.0
            }
        };
        let score = finalize_score(score);

        let missing: BTreeSet<String> = job_skills.difference(&user.skills).cloned().collect();
        MatchResult {
            match_score: score,
            recommendations: score_recommendation(score, &missing),
            experience_match: experience_match(
                user.experience_years,
                self.policy.experience_baseline_years,
            )
            .min(1.0),
            skill_overlap: matched.overlap,
            job_skills,
            user_skills: user.skills,
            missing_skills: missing,
        }
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Regression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Lexicon;
    use crate::training::pipeline::tests::{corpus, small_config};
    use crate::training::train;

    fn model() -> MatchModel {
        train(&corpus(), &small_config(), Lexicon::shared()).unwrap().0
    }

    #[test]
    fn test_result_invariants() {
        let model = model();
        let req = MatchRequest {
            user_skills: vec!["Python".into(), "react".into(), "rust".into()],
            user_experience: 6.0,
            job_description: "Python and React developer".into(),
            job_requirements: Some("Docker a plus".into()),
            ..Default::default()
        };
        let result = model.predict_match(&req);

        assert!((0.0..=100.0).contains(&result.match_score));
        assert_eq!(result.skill_overlap, 2);
        assert!(result.skill_overlap <= result.user_skills.len().min(result.job_skills.len()));
        let expected_missing: BTreeSet<String> = ["docker".to_string()].into();
        assert_eq!(result.missing_skills, expected_missing);
        assert_eq!(result.experience_match, 1.0);
        assert!(result.recommendations.contains("Consider learning: docker"));
    }

    #[test]
    fn test_empty_user_skills_lists_all_job_skills_missing() {
        let model = model();
        let req = MatchRequest {
            job_description: "AWS and Kubernetes platform engineer".into(),
            ..Default::default()
        };
        let result = model.predict_match(&req);
        assert_eq!(result.skill_overlap, 0);
        assert_eq!(result.missing_skills, result.job_skills);
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn test_width_mismatch_falls_back_to_skill_ratio() {
        let mut model = model();
        let rows = vec![
            FeatureRow {
                numeric: vec![0.0],
                text: Default::default(),
            };
            2
        ];
        model.forest = RandomForest::fit(
            &rows,
            &[10.0, 10.0],
            1,
            &Default::default(),
            0,
        )
        .unwrap();
        let req = MatchRequest {
            user_skills: vec!["python".into(), "sql".into()],
            user_experience: 1.0,
            job_description: "Python role".into(),
            ..Default::default()
        };
        assert_eq!(model.predict_match(&req).match_score, 50.0);
    }

    #[test]
    fn test_experience_match_uses_baseline() {
        let mut model = model();
        model.policy.experience_baseline_years = 4.0;
        let req = MatchRequest {
            user_skills: vec!["python".into()],
            user_experience: 1.0,
            job_description: "Python role".into(),
            ..Default::default()
        };
        assert_eq!(model.predict_match(&req).experience_match, 0.25);
    }
}
