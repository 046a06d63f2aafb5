use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A candidate's skills (lowercased, trimmed, deduplicated) and years of experience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub skills: BTreeSet<String>,
    pub experience_years: f64,
}

impl UserProfile {
    pub fn new<I, S>(skills: I, experience_years: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skills = skills
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let experience_years = if experience_years.is_finite() {
            experience_years.max(0.0)
        } else {
            0.0
        };
        Self {
            skills,
            experience_years,
        }
    }
}
