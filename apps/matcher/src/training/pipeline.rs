//! End-to-end model fitting: corpus → derived job features → synthetic
//! interactions → TF-IDF + scaler → random forest → held-out metrics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::features::{DerivedJobFeatures, FeatureAssembler, NUM_FEATURES};
use crate::models::JobPosting;
use crate::scoring::regressor::{MatchModel, MatchPolicy, ModelProvenance};
use crate::text::{Lexicon, SkillExtractor, TextPreprocessor};
use crate::training::forest::{ForestConfig, RandomForest};
use crate::training::matrix::{FeatureRow, SparseVector};
use crate::training::metrics::{r2_score, rmse, TrainingMetrics};
use crate::training::scaler::StandardScaler;
use crate::training::synthetic::{LabelPolicy, SyntheticInteractionGenerator};
use crate::training::vectorizer::{TfidfConfig, TfidfVectorizer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of synthetic interactions to generate.
    pub interactions: usize,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Train on a random subset of this many jobs; `None` uses the whole corpus.
    pub sample_jobs: Option<usize>,
    pub test_fraction: f64,
    pub vectorizer: TfidfConfig,
    pub forest: ForestConfig,
    pub label_policy: LabelPolicy,
    pub match_policy: MatchPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            interactions: 5000,
            seed: Some(42),
            sample_jobs: None,
            test_fraction: 0.2,
            vectorizer: TfidfConfig::default(),
            forest: ForestConfig::default(),
            label_policy: LabelPolicy::default(),
            match_policy: MatchPolicy::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.interactions < 2 {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "need at least 2 interactions, got {}",
                self.interactions
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "test_fraction {} must be in (0, 1)",
                self.test_fraction
            )));
        }
        if self.sample_jobs == Some(0) {
            return Err(MatchError::InvalidTrainingConfig(
                "sample_jobs must be positive when set".into(),
            ));
        }
        self.vectorizer.validate()?;
        self.forest.validate()?;
        self.label_policy.validate()?;
        self.match_policy.validate()
    }
}

/// Fits a complete model on `jobs`. Deterministic for a fixed `config.seed`.
pub fn train(
    jobs: &[JobPosting],
    config: &TrainingConfig,
    lexicon: Arc<Lexicon>,
) -> Result<(MatchModel, TrainingMetrics), MatchError> {
    config.validate()?;
    if jobs.is_empty() {
        return Err(MatchError::EmptyCorpus);
    }

    let master_seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(master_seed);

    let jobs = sample_jobs(jobs, config.sample_jobs, &mut rng);
    info!(jobs = jobs.len(), interactions = config.interactions, "Training match model");

    let preprocessor = TextPreprocessor::english();
    let extractor = SkillExtractor::new(lexicon);
    let assembler = FeatureAssembler::new(&preprocessor, &extractor);

    let encoders = FeatureAssembler::fit_encoders(&jobs);
    let derived: Vec<DerivedJobFeatures> = jobs
        .iter()
        .map(|job| assembler.derive_job(job, &encoders))
        .collect();

    let mut generator =
        SyntheticInteractionGenerator::new(config.label_policy.clone(), Some(master_seed))?;
    let interactions = generator.generate(&derived, config.interactions);

    // join interactions back to their job by id
    let by_id: HashMap<&str, &DerivedJobFeatures> =
        derived.iter().map(|d| (d.job_id.as_str(), d)).collect();
    let joined: Vec<(&DerivedJobFeatures, _)> = interactions
        .iter()
        .filter_map(|row| by_id.get(row.job_id.as_str()).map(|job| (*job, row)))
        .collect();
    if joined.len() < 2 {
        return Err(MatchError::InvalidTrainingConfig(format!(
            "only {} interactions joined to corpus jobs",
            joined.len()
        )));
    }

    let documents: Vec<&str> = joined.iter().map(|(job, _)| job.combined_text.as_str()).collect();
    let vectorizer = TfidfVectorizer::fit(&documents, &config.vectorizer)?;

    let numeric: Vec<[f64; NUM_FEATURES]> = joined
        .iter()
        .map(|(job, row)| FeatureAssembler::pair_features(job, &row.user).to_row())
        .collect();
    let scaler = StandardScaler::fit(&numeric)?;

    let mut text_cache: HashMap<&str, SparseVector> = HashMap::new();
    let mut samples: Vec<(FeatureRow, f64)> = Vec::with_capacity(joined.len());
    for ((job, row), values) in joined.iter().zip(&numeric) {
        let text = text_cache
            .entry(job.job_id.as_str())
            .or_insert_with(|| vectorizer.transform(&job.combined_text))
            .clone();
        samples.push((
            FeatureRow {
                numeric: scaler.transform(values)?,
                text,
            },
            row.label,
        ));
    }

    samples.shuffle(&mut rng);
    let n = samples.len();
    let test_rows = ((n as f64 * config.test_fraction).ceil() as usize).min(n - 1);
    let test = samples.split_off(n - test_rows);
    let (train_x, train_y): (Vec<FeatureRow>, Vec<f64>) = samples.into_iter().unzip();
    let (test_x, test_y): (Vec<FeatureRow>, Vec<f64>) = test.into_iter().unzip();

    let n_features = NUM_FEATURES + vectorizer.vocabulary_len();
    let forest = RandomForest::fit(&train_x, &train_y, n_features, &config.forest, master_seed)?;

    let train_pred: Vec<f64> = train_x.iter().map(|r| forest.predict(r)).collect();
    let test_pred: Vec<f64> = test_x.iter().map(|r| forest.predict(r)).collect();
    let metrics = TrainingMetrics {
        train_r2: r2_score(&train_y, &train_pred),
        test_r2: r2_score(&test_y, &test_pred),
        train_rmse: rmse(&train_y, &train_pred),
        test_rmse: rmse(&test_y, &test_pred),
        train_rows: train_x.len(),
        test_rows: test_x.len(),
    };
    info!(
        train_r2 = metrics.train_r2,
        test_r2 = metrics.test_r2,
        train_rmse = metrics.train_rmse,
        test_rmse = metrics.test_rmse,
        vocabulary = vectorizer.vocabulary_len(),
        "Model training completed"
    );

    let provenance = ModelProvenance {
        artifact_id: Uuid::new_v4(),
        created_at: Utc::now(),
        corpus_rows: jobs.len(),
        interactions: n,
        seed: config.seed,
    };
    let model = MatchModel {
        preprocessor,
        extractor,
        encoders,
        vectorizer,
        scaler,
        forest,
        policy: config.match_policy.clone(),
        provenance,
        metrics: metrics.clone(),
    };
    Ok((model, metrics))
}

/// Seeded subset of at most `limit` jobs, in corpus order.
fn sample_jobs(jobs: &[JobPosting], limit: Option<usize>, rng: &mut StdRng) -> Vec<JobPosting> {
    match limit {
        Some(k) if k < jobs.len() => {
            let mut picked = index::sample(rng, jobs.len(), k).into_vec();
            picked.sort_unstable();
            picked.into_iter().map(|i| jobs[i].clone()).collect()
        }
        _ => jobs.to_vec(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::MatchRequest;
    use crate::scoring::MatchScorer;

    pub(crate) fn corpus() -> Vec<JobPosting> {
        let descriptions = [
            "Backend engineer with Python, Django and PostgreSQL experience",
            "Frontend developer skilled in React, JavaScript and TypeScript",
            "Cloud engineer running AWS, Docker and Kubernetes workloads",
            "Data scientist using Python, pandas and machine learning",
            "Java developer building Spring services with SQL databases",
            "Full stack developer with Node.js, MongoDB and React",
            "DevOps engineer automating Jenkins pipelines with Git and Docker",
            "Mobile developer using Kotlin and Swift with REST APIs",
        ];
        descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| JobPosting {
                job_id: format!("J{i}"),
                description: Some(d.to_string()),
                qualifications: Some("Bachelor degree in computer science".into()),
                responsibilities: Some("Design build and maintain production services".into()),
                experience: Some(format!("{} to {} Years", i % 4, i % 4 + 5)),
                salary_range: Some("$55K-$110K".into()),
                work_type: Some(["Full-Time", "Contract", "Intern"][i % 3].into()),
                company_size: Some(format!("{}", 1000 * (i + 1))),
                country: Some(["France", "Japan"][i % 2].into()),
            })
            .collect()
    }

    pub(crate) fn small_config() -> TrainingConfig {
        TrainingConfig {
            interactions: 300,
            seed: Some(7),
            vectorizer: TfidfConfig {
                min_df: 1,
                ..TfidfConfig::default()
            },
            forest: ForestConfig {
                n_trees: 10,
                max_depth: 8,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        }
    }

    fn request() -> MatchRequest {
        MatchRequest {
            user_skills: vec!["python".into(), "sql".into()],
            user_experience: 4.0,
            job_description: "Python engineer with SQL and AWS".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_train_reports_partition_sizes() {
        let (_, metrics) = train(&corpus(), &small_config(), Lexicon::shared()).unwrap();
        assert_eq!(metrics.test_rows, 60);
        assert_eq!(metrics.train_rows, 240);
        assert!(metrics.train_rmse.is_finite());
        assert!(metrics.test_rmse.is_finite());
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (a, _) = train(&corpus(), &small_config(), Lexicon::shared()).unwrap();
        let (b, _) = train(&corpus(), &small_config(), Lexicon::shared()).unwrap();
        assert_eq!(a.predict_match(&request()), b.predict_match(&request()));
    }

    #[test]
    fn test_trained_model_scores_full_skill_match_above_half() {
        let config = TrainingConfig {
            forest: ForestConfig::default(),
            ..small_config()
        };
        let (model, _) = train(&corpus(), &config, Lexicon::shared()).unwrap();
        let result = model.predict_match(&MatchRequest {
            user_skills: vec!["python".into(), "javascript".into(), "react".into()],
            user_experience: 3.0,
            job_description: "We need a Python developer with React experience".into(),
            job_requirements: Some("3+ years experience required".into()),
            ..Default::default()
        });

        assert!(result.job_skills.contains("python"));
        assert!(result.job_skills.contains("react"));
        assert_eq!(result.skill_overlap, 2);
        assert!(result.missing_skills.is_empty());
        assert!(result.match_score > 50.0, "score {}", result.match_score);
    }

    #[test]
    fn test_sample_jobs_limits_corpus() {
        let config = TrainingConfig {
            sample_jobs: Some(3),
            ..small_config()
        };
        let (model, _) = train(&corpus(), &config, Lexicon::shared()).unwrap();
        assert_eq!(model.provenance().corpus_rows, 3);
    }

    #[test]
    fn test_rejects_too_few_interactions() {
        let config = TrainingConfig {
            interactions: 1,
            ..small_config()
        };
        assert!(matches!(
            train(&corpus(), &config, Lexicon::shared()),
            Err(MatchError::InvalidTrainingConfig(_))
        ));
    }

    #[test]
    fn test_rejects_test_fraction_outside_open_unit_interval() {
        for test_fraction in [0.0, 1.0, -0.1, f64::NAN] {
            let config = TrainingConfig {
                test_fraction,
                ..small_config()
            };
            assert!(
                matches!(config.validate(), Err(MatchError::InvalidTrainingConfig(_))),
                "accepted test_fraction {test_fraction}"
            );
        }
        let config = TrainingConfig {
            test_fraction: 0.01,
            ..small_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_corpus() {
        assert!(matches!(
            train(&[], &small_config(), Lexicon::shared()),
            Err(MatchError::EmptyCorpus)
        ));
    }
}
