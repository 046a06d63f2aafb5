use serde::{Deserialize, Serialize};

use crate::errors::MatchError;

/// Per-column standardization: (x - mean) / std, population std.
/// Zero-variance columns keep scale 1 so they pass through centered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, MatchError> {
        let Some(first) = rows.first() else {
            return Err(MatchError::InvalidTrainingConfig(
                "cannot fit scaler on zero rows".into(),
            ));
        };
        let width = first.as_ref().len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return Err(MatchError::FeatureMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in rows {
            for ((acc, v), m) in var.iter_mut().zip(row.as_ref()).zip(&mean) {
                let d = v - m;
                *acc += d * d;
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > 0.0 && std.is_finite() {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, MatchError> {
        if row.len() != self.width() {
            return Err(MatchError::FeatureMismatch {
                expected: self.width(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn is_consistent(&self) -> bool {
        self.mean.len() == self.scale.len()
            && self.mean.iter().all(|m| m.is_finite())
            && self.scale.iter().all(|s| s.is_finite() && *s > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.transform(&[1.0, 10.0]).unwrap(), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform(&[3.0, 12.0]).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_width_mismatch_is_feature_error() {
        let scaler = StandardScaler::fit(&[[0.0, 1.0, 2.0]]).unwrap();
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::FeatureMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(StandardScaler::fit(&rows).is_err());
    }

    #[test]
    fn test_empty_fit_rejected() {
        let rows: Vec<Vec<f64>> = vec![];
        assert!(StandardScaler::fit(&rows).is_err());
    }
}
