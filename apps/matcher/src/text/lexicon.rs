//! Skill lexicon — the single vocabulary of recognized technology terms.
//!
//! Both the `SkillExtractor` and the fallback scorer hold an `Arc<Lexicon>`;
//! nothing else keeps its own list of skills.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::RegexSet;

/// One recognized term. `pattern` is a regex body; `None` means the escaped term.
#[derive(Debug, Clone, Copy)]
pub struct SkillTerm {
    pub canonical: &'static str,
    pub pattern: Option<&'static str>,
}

const fn term(canonical: &'static str) -> SkillTerm {
    SkillTerm {
        canonical,
        pattern: None,
    }
}

const fn variant(canonical: &'static str, pattern: &'static str) -> SkillTerm {
    SkillTerm {
        canonical,
        pattern: Some(pattern),
    }
}

/// An ordered group of terms.
#[derive(Debug, Clone, Copy)]
pub struct LexiconGroup {
    pub terms: &'static [SkillTerm],
}

pub const BUILTIN_GROUPS: &[LexiconGroup] = &[
    // languages
    LexiconGroup {
        terms: &[
            term("python"),
            term("java"),
            term("javascript"),
            term("react"),
            variant("node.js", r"node\.?js"),
            term("angular"),
            term("vue"),
            term("typescript"),
            term("go"),
            term("rust"),
            term("c++"),
            term("c#"),
            term("kotlin"),
            term("swift"),
        ],
    },
    // databases
    LexiconGroup {
        terms: &[
            term("sql"),
            term("mysql"),
            term("postgresql"),
            term("mongodb"),
            term("redis"),
            term("elasticsearch"),
            term("cassandra"),
            term("dynamodb"),
            term("oracle"),
            term("sqlite"),
        ],
    },
    // cloud_devops
    LexiconGroup {
        terms: &[
            term("aws"),
            term("azure"),
            term("gcp"),
            term("google cloud"),
            term("docker"),
            term("kubernetes"),
            term("jenkins"),
            term("git"),
            term("github"),
            term("gitlab"),
            term("bitbucket"),
        ],
    },
    // web
    LexiconGroup {
        terms: &[
            term("html"),
            term("css"),
            term("bootstrap"),
            term("sass"),
            term("less"),
            term("webpack"),
            term("babel"),
            term("npm"),
            term("yarn"),
            term("gulp"),
            term("grunt"),
        ],
    },
    // frameworks
    LexiconGroup {
        terms: &[
            term("django"),
            term("flask"),
            term("spring"),
            term("express"),
            term("laravel"),
            term("rails"),
            term("fastapi"),
            term("nestjs"),
            term("asp.net"),
        ],
    },
    // ml
    LexiconGroup {
        terms: &[
            term("machine learning"),
            term("ai"),
            term("data science"),
            term("deep learning"),
            term("nlp"),
            term("computer vision"),
            term("ml"),
        ],
    },
    // data_libraries
    LexiconGroup {
        terms: &[
            term("tensorflow"),
            term("pytorch"),
            term("scikit-learn"),
            term("pandas"),
            term("numpy"),
            term("matplotlib"),
            term("seaborn"),
            term("jupyter"),
        ],
    },
    // process_testing
    LexiconGroup {
        terms: &[
            term("agile"),
            term("scrum"),
            term("kanban"),
            term("devops"),
            term("ci/cd"),
            term("testing"),
            term("junit"),
            term("jest"),
            term("pytest"),
            term("selenium"),
        ],
    },
    // systems
    LexiconGroup {
        terms: &[
            term("linux"),
            term("unix"),
            term("windows"),
            term("macos"),
            term("shell"),
            term("bash"),
            term("powershell"),
            term("cmd"),
        ],
    },
    // api_styles
    LexiconGroup {
        terms: &[
            term("rest"),
            term("api"),
            term("graphql"),
            term("microservices"),
            term("serverless"),
            term("lambda"),
            term("restful"),
        ],
    },
    // servers
    LexiconGroup {
        terms: &[
            term("redis"),
            term("memcached"),
            term("nginx"),
            term("apache"),
            term("tomcat"),
            term("iis"),
        ],
    },
    // collaboration
    LexiconGroup {
        terms: &[
            term("jira"),
            term("confluence"),
            term("slack"),
            term("teams"),
            term("trello"),
            term("asana"),
        ],
    },
];

static BUILTIN_LEXICON: Lazy<Arc<Lexicon>> = Lazy::new(|| {
    Arc::new(Lexicon::new(BUILTIN_GROUPS).expect("built-in lexicon patterns are valid"))
});

/// Compiled lexicon: canonical terms in group order plus one `RegexSet`
/// whose pattern `i` matches term `i` as a whole word.
#[derive(Debug)]
pub struct Lexicon {
    terms: Vec<&'static str>,
    matcher: RegexSet,
}

impl Lexicon {
    /// Compiles the groups. Terms repeated across groups are kept once, at
    /// their first position.
    pub fn new(groups: &[LexiconGroup]) -> Result<Self, regex::Error> {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();
        let mut patterns = Vec::new();

        for group in groups {
            for t in group.terms {
                if !seen.insert(t.canonical) {
                    continue;
                }
                terms.push(t.canonical);
                patterns.push(whole_word_pattern(t));
            }
        }

        Ok(Self {
            terms,
            matcher: RegexSet::new(&patterns)?,
        })
    }

    /// The process-wide built-in lexicon.
    pub fn shared() -> Arc<Lexicon> {
        Arc::clone(&BUILTIN_LEXICON)
    }

    /// Canonical terms in lexicon order. Stored in model artifacts so a
    /// model trained against a different vocabulary is rejected on load.
    pub fn fingerprint(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Every canonical term found in `text`.
    pub fn find(&self, text: &str) -> BTreeSet<String> {
        if text.is_empty() {
            return BTreeSet::new();
        }
        let lowered = text.to_lowercase();
        self.matcher
            .matches(&lowered)
            .into_iter()
            .map(|i| self.terms[i].to_string())
            .collect()
    }
}

/// `\b` on sides where the term starts/ends with a word character, an explicit
/// non-word-or-edge match otherwise (so `c++` and `c#` still match whole).
fn whole_word_pattern(t: &SkillTerm) -> String {
    let body = t
        .pattern
        .map(str::to_string)
        .unwrap_or_else(|| regex::escape(t.canonical));
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let left = if is_word(t.canonical.chars().next()) {
        r"\b"
    } else {
        r"(?:^|\W)"
    };
    let right = if is_word(t.canonical.chars().last()) {
        r"\b"
    } else {
        r"(?:$|\W)"
    };
    format!("(?i){left}(?:{body}){right}")
}

/// Detects lexicon terms in free text.
#[derive(Debug, Clone)]
pub struct SkillExtractor {
    lexicon: Arc<Lexicon>,
}

impl Default for SkillExtractor {
    fn default() -> Self {
        Self::new(Lexicon::shared())
    }
}

impl SkillExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        self.lexicon.find(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_whole_words_case_insensitively() {
        let ex = SkillExtractor::default();
        assert_eq!(ex.extract("Python"), ex.extract("python"));
        assert_eq!(
            ex.extract("We need a Python developer with React experience"),
            set(&["python", "react"])
        );
    }

    #[test]
    fn test_does_not_match_inside_words() {
        let ex = SkillExtractor::default();
        // "javascript" contains "java"; "googled" contains "go"
        assert_eq!(ex.extract("javascript"), set(&["javascript"]));
        assert!(ex.extract("googled the ruster").is_empty());
    }

    #[test]
    fn test_variant_spellings_map_to_canonical_term() {
        let ex = SkillExtractor::default();
        assert_eq!(ex.extract("NodeJS backend"), set(&["node.js"]));
        assert_eq!(ex.extract("node.js backend"), set(&["node.js"]));
    }

    #[test]
    fn test_symbol_terms_match_whole() {
        let ex = SkillExtractor::default();
        let found = ex.extract("Strong C++ and C# skills");
        assert!(found.contains("c++"));
        assert!(found.contains("c#"));
    }

    #[test]
    fn test_multi_word_terms() {
        let ex = SkillExtractor::default();
        let found = ex.extract("Machine Learning on Google Cloud, CI/CD pipelines");
        assert!(found.contains("machine learning"));
        assert!(found.contains("google cloud"));
        assert!(found.contains("ci/cd"));
    }

    #[test]
    fn test_empty_input_is_empty_set() {
        assert!(SkillExtractor::default().extract("").is_empty());
    }

    #[test]
    fn test_duplicate_terms_across_groups_kept_once() {
        let lex = Lexicon::shared();
        let redis = lex.fingerprint().iter().filter(|t| *t == "redis").count();
        assert_eq!(redis, 1);
    }

    #[test]
    fn test_repeated_extraction_is_stable() {
        let ex = SkillExtractor::default();
        let text = "AWS, Docker, Kubernetes and SQL. Docker again.";
        assert_eq!(ex.extract(text), ex.extract(text));
        assert_eq!(ex.extract(text), set(&["aws", "docker", "kubernetes", "sql"]));
    }
}
