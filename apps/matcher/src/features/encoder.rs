use serde::{Deserialize, Serialize};

/// Reserved bucket for unseen, empty, or absent categories.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Label encoder for one categorical job attribute.
///
/// Codes are indices into the sorted class list. `Unknown` is always a class,
/// so `encode` never fails for unseen input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    classes: Vec<String>,
}

impl CategoricalEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut classes: Vec<String> = values
            .into_iter()
            .map(normalize)
            .chain(std::iter::once(UNKNOWN_CATEGORY.to_string()))
            .collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn encode(&self, value: Option<&str>) -> u32 {
        let key = normalize(value);
        match self.classes.binary_search(&key) {
            Ok(idx) => idx as u32,
            Err(_) => self.unknown_code(),
        }
    }

    pub fn unknown_code(&self) -> u32 {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(UNKNOWN_CATEGORY))
            .map(|idx| idx as u32)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Classes sorted, deduplicated, and containing `Unknown`.
    pub fn is_well_formed(&self) -> bool {
        self.classes.windows(2).all(|w| w[0] < w[1])
            && self.classes.iter().any(|c| c == UNKNOWN_CATEGORY)
    }
}

fn normalize(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN_CATEGORY.to_string(),
    }
}

/// The three per-attribute encoders stored in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEncoders {
    pub work_type: CategoricalEncoder,
    pub company_size: CategoricalEncoder,
    pub country: CategoricalEncoder,
}

impl JobEncoders {
    /// Codes used when no category information is available (ad-hoc jobs).
    pub fn unknown_codes(&self) -> [u32; 3] {
        [
            self.work_type.unknown_code(),
            self.company_size.unknown_code(),
            self.country.unknown_code(),
        ]
    }
}
