use serde::{Deserialize, Serialize};

/// Sparse vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&(index as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    #[cfg(test)]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&i, &v)| (i as usize, v))
    }
}

/// One model input row: scaled numeric columns followed by the text vector.
/// Column `c` is `numeric[c]` for `c < numeric.len()`, else text column
/// `c - numeric.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    pub numeric: Vec<f64>,
    pub text: SparseVector,
}

impl FeatureRow {
    pub fn get(&self, column: usize) -> f64 {
        if column < self.numeric.len() {
            self.numeric[column]
        } else {
            self.text.get(column - self.numeric.len())
        }
    }
}
