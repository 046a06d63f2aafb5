//! TF-IDF vectorizer over canonical job text.
//!
//! Tokens are whitespace-separated words of at least two characters; terms are
//! unigrams and bigrams. Fitting keeps terms whose document frequency lies in
//! `[min_df, max_df × n_docs]`, then the `max_features` most frequent across
//! the corpus. idf = ln((1 + n) / (1 + df)) + 1, rows are l2-normalized.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::training::matrix::SparseVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfConfig {
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            min_df: 2,
            max_df: 0.8,
        }
    }
}

impl TfidfConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "ngram_range ({lo}, {hi}) must satisfy 1 <= min <= max"
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(MatchError::InvalidTrainingConfig(format!(
                "max_df {} must be in (0, 1]",
                self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(MatchError::InvalidTrainingConfig(
                "max_features must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Fitted vectorizer state. Vocabulary indices follow alphabetical term order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    ngram_range: (usize, usize),
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S], config: &TfidfConfig) -> Result<Self, MatchError> {
        config.validate()?;

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut corpus_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = extract_terms(doc.as_ref(), config.ngram_range);
            let mut seen: HashSet<&str> = HashSet::with_capacity(terms.len());
            for term in &terms {
                *corpus_freq.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        let n_docs = documents.len();
        let max_doc_count = config.max_df * n_docs as f64;

        let mut kept: Vec<(&String, usize)> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= config.min_df && (df as f64) <= max_doc_count)
            .map(|(term, _)| (term, corpus_freq[term]))
            .collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        kept.truncate(config.max_features);

        let mut terms: Vec<&String> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let vocabulary: BTreeMap<String, u32> = terms
            .iter()
            .enumerate()
            .map(|(i, term)| ((*term).clone(), i as u32))
            .collect();
        let idf = terms
            .iter()
            .map(|term| {
                let df = doc_freq[*term] as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        Ok(Self {
            ngram_range: config.ngram_range,
            vocabulary,
            idf,
        })
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    #[cfg(test)]
    pub fn vocabulary(&self) -> &BTreeMap<String, u32> {
        &self.vocabulary
    }

    /// Maps a document onto the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<u32, f64> = BTreeMap::new();
        for term in extract_terms(document, self.ngram_range) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut indices = Vec::with_capacity(counts.len());
        let mut values = Vec::with_capacity(counts.len());
        for (idx, tf) in counts {
            indices.push(idx);
            values.push(tf * self.idf[idx as usize]);
        }

        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }

        SparseVector { indices, values }
    }

    /// Vocabulary and idf agree in size and indices cover `0..len` exactly.
    pub fn is_consistent(&self) -> bool {
        let n = self.vocabulary.len();
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi || self.idf.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &idx in self.vocabulary.values() {
            match seen.get_mut(idx as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        self.idf.iter().all(|v| v.is_finite())
    }
}

fn extract_terms(document: &str, (lo, hi): (usize, usize)) -> Vec<String> {
    let tokens: Vec<&str> = document
        .split_whitespace()
        .filter(|t| t.chars().count() >= 2)
        .collect();

    let mut terms = Vec::new();
    for n in lo..=hi {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}
