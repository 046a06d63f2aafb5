//! Random forest regressor over mixed dense/sparse rows.
//!
//! Each tree is a CART regression tree grown on a bootstrap sample, choosing
//! at every node the split that minimizes the summed squared error of the two
//! children. By default every column is a candidate at every node. Text
//! columns are sparse, so split search gathers the node's non-zero entries
//! once and treats every absent entry as one block of zeros.
//!
//! Growth is fully determined by the seed: same rows + same seed = same forest.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::MatchError;
use crate::training::matrix::FeatureRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Fraction of columns tried at each split.
    pub feature_fraction: f64,
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 15,
            min_samples_split: 5,
            feature_fraction: 1.0,
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.n_trees == 0 {
            return Err(MatchError::InvalidTrainingConfig(
                "forest needs at least one tree".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(MatchError::InvalidTrainingConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "feature_fraction {} must be in (0, 1]",
                self.feature_fraction
            )));
        }
        Ok(())
    }

    fn features_per_split(&self, n_features: usize) -> usize {
        ((n_features as f64 * self.feature_fraction).ceil() as usize).clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row.get(*feature as usize) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Non-empty, children always point forward and in range, features in range.
    fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let (l, r) = (*left as usize, *right as usize);
                    (*feature as usize) < n_features
                        && threshold.is_finite()
                        && l > i
                        && r > i
                        && l < self.nodes.len()
                        && r < self.nodes.len()
                }
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(
        rows: &[FeatureRow],
        targets: &[f64],
        n_features: usize,
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "forest needs matching non-empty rows and targets (rows={}, targets={})",
                rows.len(),
                targets.len()
            )));
        }

        let n_numeric = rows[0].numeric.len();
        if let Some(bad) = rows.iter().find(|r| r.numeric.len() != n_numeric) {
            return Err(MatchError::FeatureMismatch {
                expected: n_numeric,
                actual: bad.numeric.len(),
            });
        }
        if n_features < n_numeric {
            return Err(MatchError::FeatureMismatch {
                expected: n_numeric,
                actual: n_features,
            });
        }

        let mut master = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        for t in 0..config.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let sample: Vec<usize> = if config.bootstrap {
                (0..rows.len()).map(|_| rng.gen_range(0..rows.len())).collect()
            } else {
                (0..rows.len()).collect()
            };
            let mut builder = TreeBuilder {
                rows,
                targets,
                n_numeric,
                n_features,
                config,
                rng: &mut rng,
                nodes: Vec::new(),
            };
            builder.grow(sample, 0);
            let tree = RegressionTree {
                nodes: builder.nodes,
            };
            debug!(tree = t, nodes = tree.node_count(), "grew regression tree");
            trees.push(tree);
        }

        Ok(Self { n_features, trees })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the tree predictions. The caller guarantees the row width.
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len().max(1) as f64
    }

    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tree growth
// ────────────────────────────────────────────────────────────────────────────

struct TreeBuilder<'a> {
    rows: &'a [FeatureRow],
    targets: &'a [f64],
    n_numeric: usize,
    n_features: usize,
    config: &'a ForestConfig,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Σ_left² / n_left + Σ_right² / n_right; larger means lower squared error.
    score: f64,
}

/// Run of rows sharing one column value.
#[derive(Debug, Clone, Copy)]
struct ValueBlock {
    value: f64,
    count: usize,
    sum: f64,
}

impl TreeBuilder<'_> {
    /// Appends the subtree for `sample` and returns its root index.
    fn grow(&mut self, sample: Vec<usize>, depth: usize) -> u32 {
        let n = sample.len();
        let sum: f64 = sample.iter().map(|&i| self.targets[i]).sum();
        let mean = sum / n.max(1) as f64;

        let idx = self.nodes.len() as u32;
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= self.config.max_depth || n < self.config.min_samples_split {
            return idx;
        }
        let first = self.targets[sample[0]];
        if sample.iter().all(|&i| self.targets[i] == first) {
            return idx;
        }

        let parent_score = sum * sum / n as f64;
        let Some(best) = self.best_split(&sample, sum) else {
            return idx;
        };
        if best.score <= parent_score + 1e-12 * parent_score.abs().max(1.0) {
            return idx;
        }

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.rows[i].get(best.feature) <= best.threshold);
        if left.is_empty() || right.is_empty() {
            return idx;
        }

        let left_idx = self.grow(left, depth + 1);
        let right_idx = self.grow(right, depth + 1);
        self.nodes[idx as usize] = Node::Split {
            feature: best.feature as u32,
            threshold: best.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn best_split(&mut self, sample: &[usize], total_sum: f64) -> Option<SplitCandidate> {
        if self.n_features == 0 {
            return None;
        }
        let k = self.config.features_per_split(self.n_features);
        let mut candidates = index::sample(&mut *self.rng, self.n_features, k).into_vec();
        candidates.sort_unstable();

        let mut best: Option<SplitCandidate> = None;
        let mut consider = |c: Option<SplitCandidate>| {
            if let Some(c) = c {
                if best.map_or(true, |b| c.score > b.score) {
                    best = Some(c);
                }
            }
        };

        let split_at = candidates.partition_point(|&f| f < self.n_numeric);
        let (numeric, text) = candidates.split_at(split_at);

        for &feature in numeric {
            let mut values: Vec<(f64, f64)> = sample
                .iter()
                .map(|&i| (self.rows[i].numeric[feature], self.targets[i]))
                .collect();
            values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            consider(scan_blocks(feature, &blocks_from_sorted(&values)));
        }

        if !text.is_empty() {
            // Non-zero entries of the candidate text columns, gathered in one pass.
            let wanted: HashMap<usize, usize> = text
                .iter()
                .enumerate()
                .map(|(slot, &f)| (f - self.n_numeric, slot))
                .collect();
            let mut nonzero: Vec<Vec<(f64, f64)>> = vec![Vec::new(); text.len()];
            for &i in sample {
                for (col, value) in self.rows[i].text.iter() {
                    if let Some(&slot) = wanted.get(&col) {
                        nonzero[slot].push((value, self.targets[i]));
                    }
                }
            }

            for (slot, mut entries) in nonzero.into_iter().enumerate() {
                if entries.is_empty() {
                    continue;
                }
                let zero_count = sample.len() - entries.len();
                let zero_sum = total_sum - entries.iter().map(|e| e.1).sum::<f64>();
                if zero_count > 0 {
                    entries.push((0.0, f64::NAN));
                }
                entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
                let blocks = blocks_with_zero_run(&entries, zero_count, zero_sum);
                consider(scan_blocks(text[slot], &blocks));
            }
        }

        best
    }
}

fn blocks_from_sorted(values: &[(f64, f64)]) -> Vec<ValueBlock> {
    let mut blocks: Vec<ValueBlock> = Vec::new();
    for &(value, target) in values {
        match blocks.last_mut() {
            Some(last) if last.value == value => {
                last.count += 1;
                last.sum += target;
            }
            _ => blocks.push(ValueBlock {
                value,
                count: 1,
                sum: target,
            }),
        }
    }
    blocks
}

/// Like `blocks_from_sorted`, but the `(0.0, NaN)` marker stands for
/// `zero_count` implicit zero rows with target sum `zero_sum`.
fn blocks_with_zero_run(values: &[(f64, f64)], zero_count: usize, zero_sum: f64) -> Vec<ValueBlock> {
    let mut blocks: Vec<ValueBlock> = Vec::new();
    for &(value, target) in values {
        let (count, sum) = if target.is_nan() {
            (zero_count, zero_sum)
        } else {
            (1, target)
        };
        match blocks.last_mut() {
            Some(last) if last.value == value => {
                last.count += count;
                last.sum += sum;
            }
            _ => blocks.push(ValueBlock { value, count, sum }),
        }
    }
    blocks
}

/// Best threshold between consecutive distinct values, midpoint placed.
fn scan_blocks(feature: usize, blocks: &[ValueBlock]) -> Option<SplitCandidate> {
    if blocks.len() < 2 {
        return None;
    }
    let total_count: usize = blocks.iter().map(|b| b.count).sum();
    let total_sum: f64 = blocks.iter().map(|b| b.sum).sum();

    let mut best: Option<SplitCandidate> = None;
    let (mut left_count, mut left_sum) = (0usize, 0.0f64);
    for pair in blocks.windows(2) {
        left_count += pair[0].count;
        left_sum += pair[0].sum;
        let right_count = total_count - left_count;
        let right_sum = total_sum - left_sum;
        let score = left_sum * left_sum / left_count as f64
            + right_sum * right_sum / right_count as f64;
        if best.map_or(true, |b| score > b.score) {
            let mut threshold = pair[0].value + (pair[1].value - pair[0].value) / 2.0;
            // midpoint can round up to the right value for adjacent floats
            if threshold >= pair[1].value {
                threshold = pair[0].value;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                score,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::matrix::SparseVector;

    fn dense(values: &[f64]) -> FeatureRow {
        FeatureRow {
            numeric: values.to_vec(),
            text: SparseVector::default(),
        }
    }

    fn small_config(n_trees: usize) -> ForestConfig {
        ForestConfig {
            n_trees,
            max_depth: 6,
            min_samples_split: 2,
            feature_fraction: 1.0,
            bootstrap: false,
        }
    }

    #[test]
    fn test_default_config_tries_every_column() {
        let config = ForestConfig::default();
        assert_eq!(config.features_per_split(11), 11);
        assert_eq!(config.features_per_split(1), 1);
        let half = ForestConfig {
            feature_fraction: 0.5,
            ..ForestConfig::default()
        };
        assert_eq!(half.features_per_split(11), 6);
    }

    #[test]
    fn test_single_tree_learns_step_function() {
        let rows: Vec<FeatureRow> = (0..20).map(|i| dense(&[i as f64])).collect();
        let targets: Vec<f64> = (0..20).map(|i| if i < 10 { 10.0 } else { 90.0 }).collect();
        let forest = RandomForest::fit(&rows, &targets, 1, &small_config(1), 7).unwrap();

        assert_eq!(forest.predict(&dense(&[2.0])), 10.0);
        assert_eq!(forest.predict(&dense(&[15.0])), 90.0);
        assert!(forest.is_well_formed());
    }

    #[test]
    fn test_splits_on_sparse_text_column() {
        // target depends only on whether text column 0 is present
        let rows: Vec<FeatureRow> = (0..16)
            .map(|i| FeatureRow {
                numeric: vec![1.0],
                text: if i % 2 == 0 {
                    SparseVector {
                        indices: vec![0],
                        values: vec![0.7],
                    }
                } else {
                    SparseVector::default()
                },
            })
            .collect();
        let targets: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 80.0 } else { 20.0 }).collect();
        let forest = RandomForest::fit(&rows, &targets, 3, &small_config(1), 1).unwrap();

        assert_eq!(forest.predict(&rows[0]), 80.0);
        assert_eq!(forest.predict(&rows[1]), 20.0);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let rows: Vec<FeatureRow> = (0..40)
            .map(|i| dense(&[i as f64, (i * 7 % 11) as f64]))
            .collect();
        let targets: Vec<f64> = (0..40).map(|i| (i * 3 % 17) as f64).collect();
        let config = ForestConfig {
            n_trees: 5,
            feature_fraction: 0.5,
            ..ForestConfig::default()
        };
        let a = RandomForest::fit(&rows, &targets, 2, &config, 99).unwrap();
        let b = RandomForest::fit(&rows, &targets, 2, &config, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_targets_give_single_leaf() {
        let rows: Vec<FeatureRow> = (0..10).map(|i| dense(&[i as f64])).collect();
        let targets = vec![42.0; 10];
        let forest = RandomForest::fit(&rows, &targets, 1, &small_config(1), 3).unwrap();
        assert_eq!(forest.trees[0].node_count(), 1);
        assert_eq!(forest.predict(&dense(&[100.0])), 42.0);
    }

    #[test]
    fn test_prediction_stays_within_target_range() {
        let rows: Vec<FeatureRow> = (0..30).map(|i| dense(&[i as f64, (30 - i) as f64])).collect();
        let targets: Vec<f64> = (0..30).map(|i| (i as f64 * 3.3) % 100.0).collect();
        let forest = RandomForest::fit(&rows, &targets, 2, &ForestConfig {
            n_trees: 8,
            ..ForestConfig::default()
        }, 5)
        .unwrap();
        for x in [-50.0, 0.0, 12.5, 1e6] {
            let p = forest.predict(&dense(&[x, x]));
            assert!((0.0..=100.0).contains(&p), "prediction {p} out of range");
        }
    }

    #[test]
    fn test_rejects_mismatched_targets() {
        let rows = vec![dense(&[1.0])];
        assert!(RandomForest::fit(&rows, &[], 1, &small_config(1), 0).is_err());
    }

    #[test]
    fn test_malformed_tree_detected() {
        let tree = RegressionTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 7,
            }],
        };
        assert!(!tree.is_well_formed(1));
    }
}
