//! Text canonicalization — lowercase, letters only, stopword removal, stemming.

use std::collections::HashSet;
use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

/// English stopword list applied before stemming.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Tokens this short or shorter are dropped.
const MIN_TOKEN_LEN: usize = 3;

/// Stemming algorithm recorded in the model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemmerKind {
    SnowballEnglish,
}

/// Serializable preprocessing state (stored inside the artifact).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorState {
    pub stemmer: StemmerKind,
    pub stopwords: Vec<String>,
}

/// Normalizes free text into a canonical, stemmed token stream.
pub struct TextPreprocessor {
    stemmer_kind: StemmerKind,
    stemmer: Stemmer,
    stopwords: HashSet<String>,
}

impl fmt::Debug for TextPreprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPreprocessor")
            .field("stemmer", &self.stemmer_kind)
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::english()
    }
}

impl TextPreprocessor {
    /// Snowball English stemmer with the built-in English stopword list.
    pub fn english() -> Self {
        Self::from_state(&PreprocessorState {
            stemmer: StemmerKind::SnowballEnglish,
            stopwords: ENGLISH_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Rebuilds a preprocessor from saved state.
    pub fn from_state(state: &PreprocessorState) -> Self {
        let stemmer = match state.stemmer {
            StemmerKind::SnowballEnglish => Stemmer::create(Algorithm::English),
        };
        Self {
            stemmer_kind: state.stemmer,
            stemmer,
            stopwords: state.stopwords.iter().cloned().collect(),
        }
    }

    pub fn state(&self) -> PreprocessorState {
        let mut stopwords: Vec<String> = self.stopwords.iter().cloned().collect();
        stopwords.sort();
        PreprocessorState {
            stemmer: self.stemmer_kind,
            stopwords,
        }
    }

    /// Lowercases, strips everything but letters and whitespace, drops short
    /// tokens and stopwords, then stems what remains. Order is preserved.
    pub fn canonicalize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        cleaned
            .split_whitespace()
            .filter(|t| t.len() >= MIN_TOKEN_LEN && !self.stopwords.contains(*t))
            .map(|t| self.stemmer.stem(t).into_owned())
            .collect()
    }

    /// `canonicalize` joined with single spaces.
    pub fn canonical_text(&self, text: &str) -> String {
        self.canonicalize(text).join(" ")
    }
}
