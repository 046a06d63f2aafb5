use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Input to a single match prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub user_skills: Vec<String>,
    #[serde(default)]
    pub user_experience: f64,
    pub job_description: String,
    #[serde(default)]
    pub job_requirements: Option<String>,
    #[serde(default)]
    pub job_responsibilities: Option<String>,
}

impl MatchRequest {
    /// Description, requirements and responsibilities joined with spaces.
    pub fn combined_job_text(&self) -> String {
        [
            Some(self.job_description.as_str()),
            self.job_requirements.as_deref(),
            self.job_responsibilities.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Scored comparison of one user against one job. Identical shape for every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_score: f64,
    pub job_skills: BTreeSet<String>,
    pub user_skills: BTreeSet<String>,
    pub skill_overlap: usize,
    pub missing_skills: BTreeSet<String>,
    pub experience_match: f64,
    pub recommendations: String,
}

/// Clamps to [0, 100] and rounds to two decimals.
pub fn finalize_score(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_score_clamps_and_rounds() {
        assert_eq!(finalize_score(-4.0), 0.0);
        assert_eq!(finalize_score(140.0), 100.0);
        assert_eq!(finalize_score(66.6666), 66.67);
        assert_eq!(finalize_score(f64::NAN), 0.0);
    }

    #[test]
    fn test_combined_job_text_skips_absent_parts() {
        let req = MatchRequest {
            job_description: "Rust engineer".into(),
            job_responsibilities: Some("own the API".into()),
            ..Default::default()
        };
        assert_eq!(req.combined_job_text(), "Rust engineer own the API");
    }
}
