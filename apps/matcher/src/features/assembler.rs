//! Feature Assembler — turns a job (and, for a pair, a user) into the fixed
//! numeric column layout plus the canonical text consumed by the vectorizer.
//!
//! Training and inference both go through this module so the column order
//! cannot drift between the two paths.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::features::encoder::{CategoricalEncoder, JobEncoders};
use crate::features::parsing::{extract_experience_years, extract_salary_range};
use crate::models::{JobPosting, UserProfile};
use crate::text::{SkillExtractor, TextPreprocessor};

/// Numeric column names, in matrix order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "skill_overlap",
    "skill_ratio",
    "experience_match",
    "skill_count",
    "experience_numeric",
    "work_type_encoded",
    "company_size_encoded",
    "country_encoded",
    "salary_min",
    "salary_max",
    "user_experience",
];

pub const NUM_FEATURES: usize = 11;

/// Upper bound on the experience ratio used as a feature.
pub const EXPERIENCE_MATCH_CAP: f64 = 2.0;

/// Everything derived from one job posting. Pure function of the posting and
/// the fitted encoders.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedJobFeatures {
    pub job_id: String,
    pub combined_text: String,
    pub skills: BTreeSet<String>,
    pub experience_years: u32,
    pub salary_min: u64,
    pub salary_max: u64,
    pub categorical: [u32; 3],
}

impl DerivedJobFeatures {
    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}

/// Overlap between a user's skills and a job's skills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillMatch {
    pub overlap: usize,
    /// overlap ÷ max(user skill count, 1)
    pub ratio: f64,
}

pub fn skill_match(user_skills: &BTreeSet<String>, job_skills: &BTreeSet<String>) -> SkillMatch {
    let overlap = user_skills.intersection(job_skills).count();
    SkillMatch {
        overlap,
        ratio: overlap as f64 / user_skills.len().max(1) as f64,
    }
}

/// user experience ÷ max(required, 1), capped at `EXPERIENCE_MATCH_CAP`.
pub fn experience_match(user_years: f64, required_years: f64) -> f64 {
    (user_years / required_years.max(1.0)).min(EXPERIENCE_MATCH_CAP)
}

/// One row of the numeric feature matrix, unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericFeatures {
    pub skill_overlap: f64,
    pub skill_ratio: f64,
    pub experience_match: f64,
    pub skill_count: f64,
    pub experience_numeric: f64,
    pub work_type_encoded: f64,
    pub company_size_encoded: f64,
    pub country_encoded: f64,
    pub salary_min: f64,
    pub salary_max: f64,
    pub user_experience: f64,
}

impl NumericFeatures {
    /// Values in `FEATURE_COLUMNS` order.
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [
            self.skill_overlap,
            self.skill_ratio,
            self.experience_match,
            self.skill_count,
            self.experience_numeric,
            self.work_type_encoded,
            self.company_size_encoded,
            self.country_encoded,
            self.salary_min,
            self.salary_max,
            self.user_experience,
        ]
    }
}

/// Borrowing view over the preprocessing components.
#[derive(Debug, Clone, Copy)]
pub struct FeatureAssembler<'a> {
    preprocessor: &'a TextPreprocessor,
    extractor: &'a SkillExtractor,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(preprocessor: &'a TextPreprocessor, extractor: &'a SkillExtractor) -> Self {
        Self {
            preprocessor,
            extractor,
        }
    }

    pub fn extract_skills(&self, text: &str) -> BTreeSet<String> {
        self.extractor.extract(text)
    }

    /// Canonical tokens of each part, joined in order.
    pub fn job_text(&self, parts: &[Option<&str>]) -> String {
        parts
            .iter()
            .flatten()
            .flat_map(|part| self.preprocessor.canonicalize(part))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn fit_encoders(jobs: &[JobPosting]) -> JobEncoders {
        JobEncoders {
            work_type: CategoricalEncoder::fit(jobs.iter().map(|j| j.work_type.as_deref())),
            company_size: CategoricalEncoder::fit(jobs.iter().map(|j| j.company_size.as_deref())),
            country: CategoricalEncoder::fit(jobs.iter().map(|j| j.country.as_deref())),
        }
    }

    /// Skills come from the description only; text combines all three fields.
    pub fn derive_job(&self, job: &JobPosting, encoders: &JobEncoders) -> DerivedJobFeatures {
        let (salary_min, salary_max) = extract_salary_range(job.salary_range.as_deref());
        DerivedJobFeatures {
            job_id: job.job_id.clone(),
            combined_text: self.job_text(&[
                job.description.as_deref(),
                job.qualifications.as_deref(),
                job.responsibilities.as_deref(),
            ]),
            skills: self.extract_skills(job.description.as_deref().unwrap_or_default()),
            experience_years: extract_experience_years(job.experience.as_deref()),
            salary_min,
            salary_max,
            categorical: [
                encoders.work_type.encode(job.work_type.as_deref()),
                encoders.company_size.encode(job.company_size.as_deref()),
                encoders.country.encode(job.country.as_deref()),
            ],
        }
    }

    /// Training row for a (user, corpus job) pair.
    pub fn pair_features(job: &DerivedJobFeatures, user: &UserProfile) -> NumericFeatures {
        let matched = skill_match(&user.skills, &job.skills);
        NumericFeatures {
            skill_overlap: matched.overlap as f64,
            skill_ratio: matched.ratio,
            experience_match: experience_match(user.experience_years, job.experience_years as f64),
            skill_count: job.skill_count() as f64,
            experience_numeric: job.experience_years as f64,
            work_type_encoded: job.categorical[0] as f64,
            company_size_encoded: job.categorical[1] as f64,
            country_encoded: job.categorical[2] as f64,
            salary_min: job.salary_min as f64,
            salary_max: job.salary_max as f64,
            user_experience: user.experience_years,
        }
    }

    /// Inference row for an ad-hoc job that has no corpus metadata: required
    /// experience and salary are 0, categories are the Unknown codes, and the
    /// experience ratio is taken against `baseline_years`.
    pub fn adhoc_features(
        user: &UserProfile,
        job_skills: &BTreeSet<String>,
        encoders: &JobEncoders,
        baseline_years: f64,
    ) -> NumericFeatures {
        let matched = skill_match(&user.skills, job_skills);
        let [work_type, company_size, country] = encoders.unknown_codes();
        NumericFeatures {
            skill_overlap: matched.overlap as f64,
            skill_ratio: matched.ratio,
            experience_match: experience_match(user.experience_years, baseline_years),
            skill_count: job_skills.len() as f64,
            experience_numeric: 0.0,
            work_type_encoded: work_type as f64,
            company_size_encoded: company_size as f64,
            country_encoded: country as f64,
            salary_min: 0.0,
            salary_max: 0.0,
            user_experience: user.experience_years,
        }
    }
}
