//! Rule-based scorer that needs no trained artifact.
//!
//! score = (overlap ÷ |job skills| × 0.7 + min(1, years ÷ 5) × 0.3) × 100

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::match_result::finalize_score;
use crate::models::{MatchRequest, MatchResult, UserProfile};
use crate::scoring::recommend::fallback_recommendation;
use crate::scoring::{BackendKind, MatchScorer};
use crate::text::{Lexicon, SkillExtractor};

const SKILL_WEIGHT: f64 = 0.7;
const EXPERIENCE_WEIGHT: f64 = 0.3;
/// Years of experience counted as a full experience match.
const EXPERIENCE_SATURATION_YEARS: f64 = 5.0;

const NO_SKILLS_SCORE: f64 = 30.0;
const NO_SKILLS_EXPERIENCE_MATCH: f64 = 0.5;
const NO_SKILLS_ADVICE: &str = "Please ensure your resume contains relevant technical skills";

#[derive(Debug, Clone)]
pub struct FallbackMatcher {
    extractor: SkillExtractor,
}

impl Default for FallbackMatcher {
    fn default() -> Self {
        Self::new(Lexicon::shared())
    }
}

impl FallbackMatcher {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            extractor: SkillExtractor::new(lexicon),
        }
    }
}

impl MatchScorer for FallbackMatcher {
    fn predict_match(&self, request: &MatchRequest) -> MatchResult {
        let user = UserProfile::new(&request.user_skills, request.user_experience);
        let job_skills = self.extractor.extract(&request.combined_job_text());

        if user.skills.is_empty() || job_skills.is_empty() {
            return MatchResult {
                match_score: NO_SKILLS_SCORE,
                missing_skills: job_skills.clone(),
                job_skills,
                user_skills: user.skills,
                skill_overlap: 0,
                experience_match: NO_SKILLS_EXPERIENCE_MATCH,
                recommendations: NO_SKILLS_ADVICE.to_string(),
            };
        }

        let overlapping: BTreeSet<String> =
            job_skills.intersection(&user.skills).cloned().collect();
        let missing: BTreeSet<String> = job_skills.difference(&user.skills).cloned().collect();

        let skill_ratio = overlapping.len() as f64 / job_skills.len() as f64;
        let experience_match = (user.experience_years / EXPERIENCE_SATURATION_YEARS).min(1.0);
        let score = (skill_ratio * SKILL_WEIGHT + experience_match * EXPERIENCE_WEIGHT) * 100.0;

        MatchResult {
            match_score: finalize_score(score),
            recommendations: fallback_recommendation(&missing, &overlapping, user.experience_years),
            skill_overlap: overlapping.len(),
            job_skills,
            user_skills: user.skills,
            missing_skills: missing,
            experience_match,
        }
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(skills: &[&str], years: f64, description: &str) -> MatchRequest {
        MatchRequest {
            user_skills: skills.iter().map(|s| s.to_string()).collect(),
            user_experience: years,
            job_description: description.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_python_react_scenario() {
        let req = MatchRequest {
            job_requirements: Some("3+ years experience required".into()),
            ..request(
                &["python", "javascript", "react"],
                3.0,
                "We need a Python developer with React experience",
            )
        };
        let result = FallbackMatcher::default().predict_match(&req);

        assert!(result.job_skills.contains("python"));
        assert!(result.job_skills.contains("react"));
        assert_eq!(result.skill_overlap, 2);
        assert!(result.missing_skills.is_empty());
        assert!(result.match_score > 50.0);
        assert_eq!(result.match_score, 88.0);
    }

    #[test]
    fn test_empty_user_skills() {
        let result = FallbackMatcher::default()
            .predict_match(&request(&[], 4.0, "Rust and Kubernetes engineer"));
        assert_eq!(result.match_score, 30.0);
        assert_eq!(result.skill_overlap, 0);
        assert_eq!(result.missing_skills, result.job_skills);
        assert!(!result.job_skills.is_empty());
        assert_eq!(result.experience_match, 0.5);
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn test_no_recognized_job_skills() {
        let result = FallbackMatcher::default()
            .predict_match(&request(&["python"], 4.0, "Friendly barista wanted"));
        assert_eq!(result.match_score, 30.0);
        assert!(result.job_skills.is_empty());
    }

    #[test]
    fn test_partial_match_scores_and_advises() {
        let result = FallbackMatcher::default().predict_match(&request(
            &["Python"],
            10.0,
            "Python, Docker and AWS engineer",
        ));
        // 1/3 × 0.7 + 1.0 × 0.3
        assert!((result.match_score - 53.33).abs() < 1e-9);
        assert_eq!(result.experience_match, 1.0);
        assert!(result.recommendations.starts_with("Consider learning: aws, docker"));
        assert!(result.recommendations.contains("Highlight your experience with: python"));
    }

    #[test]
    fn test_overlap_bounded_by_both_sets() {
        let result = FallbackMatcher::default().predict_match(&request(
            &["python", "go", "sql", "aws"],
            2.0,
            "SQL analyst",
        ));
        assert!(result.skill_overlap <= result.user_skills.len().min(result.job_skills.len()));
    }
}
