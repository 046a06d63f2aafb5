//! Numeric extraction from free-text corpus fields. Never fails: unparseable
//! input yields the documented default (0 years, (0, 0) salary).

use once_cell::sync::Lazy;
use regex::Regex;

/// Tried in order; the first pattern that matches wins.
static EXPERIENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d+)\+\s*years?",
        r"(\d+)\s*to\s*\d+\s*years?",
        r"(\d+)\s*-\s*\d+\s*years?",
        r"(\d+)\s*years?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("experience pattern is valid"))
    .collect()
});

static SALARY_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9\s\-k]").expect("salary noise pattern is valid"));

static SALARY_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)k?\s*-\s*(\d+)k?").expect("salary pattern is valid"));

static SALARY_GROUPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+),?(\d{3})?\s*-\s*(\d+),?(\d{3})?").expect("salary pattern is valid")
});

/// Required years of experience: `"3+ years"` → 3, `"2 to 5 years"` → 2,
/// `"2-5 years"` → 2, `"4 years"` → 4, anything else → 0.
pub fn extract_experience_years(text: Option<&str>) -> u32 {
    let Some(text) = text else {
        return 0;
    };
    let lowered = text.to_lowercase();

    EXPERIENCE_PATTERNS
        .iter()
        .find_map(|re| {
            re.captures(&lowered)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        })
        .unwrap_or(0)
}

/// Salary bounds from a range such as `"$59K-$99K"` or `"50,000 - 80,000"`.
/// A `k` anywhere in the cleaned text multiplies both bounds by 1000.
pub fn extract_salary_range(text: Option<&str>) -> (u64, u64) {
    let Some(text) = text else {
        return (0, 0);
    };
    let lowered = text.to_lowercase();
    let cleaned = SALARY_NOISE.replace_all(&lowered, "");
    let multiplier: u64 = if cleaned.contains('k') { 1000 } else { 1 };

    let scaled = |(min, max): (u64, u64)| {
        Some((min.checked_mul(multiplier)?, max.checked_mul(multiplier)?))
    };

    if let Some(caps) = SALARY_RANGE.captures(&cleaned) {
        let bounds = (|| {
            let min = caps.get(1)?.as_str().parse::<u64>().ok()?;
            let max = caps.get(2)?.as_str().parse::<u64>().ok()?;
            scaled((min, max))
        })();
        if let Some(bounds) = bounds {
            return bounds;
        }
    }

    if let Some(caps) = SALARY_GROUPED.captures(&cleaned) {
        let join = |lead: usize, group: usize| -> Option<u64> {
            let mut digits = caps.get(lead)?.as_str().to_string();
            if let Some(g) = caps.get(group) {
                digits.push_str(g.as_str());
            }
            digits.parse::<u64>().ok()
        };
        if let Some(bounds) = join(1, 2)
            .zip(join(3, 4))
            .and_then(scaled)
        {
            return bounds;
        }
    }

    (0, 0)
}
