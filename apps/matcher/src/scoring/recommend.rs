//! Human-readable advice attached to every match result.

use std::collections::BTreeSet;

/// Advice for a model score, plus up to three skills worth learning.
pub fn score_recommendation(score: f64, missing: &BTreeSet<String>) -> String {
    let mut parts = vec![if score < 30.0 {
        "This role may be challenging given your current skill set.".to_string()
    } else if score < 60.0 {
        "Consider developing some missing skills before applying.".to_string()
    } else {
        "You're a good match for this role!".to_string()
    }];
    if let Some(learn) = consider_learning(missing) {
        parts.push(learn);
    }
    parts.join(" ")
}

/// Rule-based advice used by the fallback scorer.
pub fn fallback_recommendation(
    missing: &BTreeSet<String>,
    overlapping: &BTreeSet<String>,
    experience_years: f64,
) -> String {
    let mut parts = Vec::new();
    if let Some(learn) = consider_learning(missing) {
        parts.push(learn);
    }
    if experience_years < 3.0 {
        parts.push("Build more hands-on experience with relevant technologies".to_string());
    }
    if !overlapping.is_empty() {
        let top: Vec<&str> = overlapping.iter().take(2).map(String::as_str).collect();
        parts.push(format!("Highlight your experience with: {}", top.join(", ")));
    }
    if parts.is_empty() {
        "Good match for this position!".to_string()
    } else {
        parts.join("; ")
    }
}

fn consider_learning(missing: &BTreeSet<String>) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let top: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
    Some(format!("Consider learning: {}", top.join(", ")))
}
