//! Synthetic interaction generation.
//!
//! The corpus has jobs but no candidates, so training rows are produced by
//! sampling fake user profiles against real jobs and labelling each pair with
//! a formula (skill ratio and experience fit, plus Gaussian noise). The
//! formula lives in [`LabelPolicy`] so it can be tuned without code changes.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::features::{experience_match, skill_match, DerivedJobFeatures};
use crate::models::UserProfile;

/// Skills the sampled users draw from.
pub const DEFAULT_SKILL_VOCABULARY: [&str; 12] = [
    "python",
    "javascript",
    "react",
    "sql",
    "aws",
    "docker",
    "git",
    "java",
    "node.js",
    "mongodb",
    "typescript",
    "angular",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPolicy {
    pub skill_vocabulary: Vec<String>,
    pub min_skills: usize,
    pub max_skills: usize,
    pub experience_mean_years: f64,
    pub noise_std: f64,
    pub skill_weight: f64,
    pub experience_weight: f64,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            skill_vocabulary: DEFAULT_SKILL_VOCABULARY.iter().map(|s| s.to_string()).collect(),
            min_skills: 3,
            max_skills: 7,
            experience_mean_years: 4.0,
            noise_std: 10.0,
            skill_weight: 50.0,
            experience_weight: 30.0,
        }
    }
}

impl LabelPolicy {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.skill_vocabulary.is_empty() {
            return Err(MatchError::InvalidTrainingConfig(
                "label policy needs a non-empty skill vocabulary".into(),
            ));
        }
        if self.min_skills == 0 || self.min_skills > self.max_skills {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "skill count range {}..={} is invalid",
                self.min_skills, self.max_skills
            )));
        }
        Ok(())
    }

    /// Noise-free label, before clamping.
    pub fn base_label(&self, skill_ratio: f64, experience_match: f64) -> f64 {
        skill_ratio * self.skill_weight + experience_match.min(1.0) * self.experience_weight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticInteraction {
    pub job_id: String,
    pub user: UserProfile,
    pub skill_overlap: usize,
    pub skill_ratio: f64,
    pub experience_match: f64,
    /// In [0, 100].
    pub label: f64,
}

pub struct SyntheticInteractionGenerator {
    policy: LabelPolicy,
    rng: StdRng,
    experience: Exp<f64>,
    noise: Normal<f64>,
}

impl SyntheticInteractionGenerator {
    /// `seed = None` draws from OS entropy; generation is then not reproducible.
    pub fn new(policy: LabelPolicy, seed: Option<u64>) -> Result<Self, MatchError> {
        policy.validate()?;
        let experience = Exp::new(1.0 / policy.experience_mean_years).map_err(|e| {
            MatchError::InvalidTrainingConfig(format!(
                "experience mean {}: {e}",
                policy.experience_mean_years
            ))
        })?;
        let noise = Normal::new(0.0, policy.noise_std).map_err(|e| {
            MatchError::InvalidTrainingConfig(format!("noise std {}: {e}", policy.noise_std))
        })?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            policy,
            rng,
            experience,
            noise,
        })
    }

    pub fn generate(&mut self, jobs: &[DerivedJobFeatures], n: usize) -> Vec<SyntheticInteraction> {
        if jobs.is_empty() {
            return Vec::new();
        }
        (0..n).map(|_| self.sample_one(jobs)).collect()
    }

    fn sample_one(&mut self, jobs: &[DerivedJobFeatures]) -> SyntheticInteraction {
        let job = &jobs[self.rng.gen_range(0..jobs.len())];

        let vocab = &self.policy.skill_vocabulary;
        let upper = self.policy.max_skills.min(vocab.len());
        let lower = self.policy.min_skills.min(upper);
        let count = self.rng.gen_range(lower..=upper);
        let skills: BTreeSet<String> = vocab
            .choose_multiple(&mut self.rng, count)
            .cloned()
            .collect();
        let experience_years = self.experience.sample(&mut self.rng);
        let user = UserProfile::new(skills, experience_years);

        let matched = skill_match(&user.skills, &job.skills);
        let exp_match = experience_match(user.experience_years, job.experience_years as f64);
        let label = (self.policy.base_label(matched.ratio, exp_match)
            + self.noise.sample(&mut self.rng))
        .clamp(0.0, 100.0);

        SyntheticInteraction {
            job_id: job.job_id.clone(),
            user,
            skill_overlap: matched.overlap,
            skill_ratio: matched.ratio,
            experience_match: exp_match,
            label,
        }
    }
}
