//! Query Classifier
//!
//! Decides whether a normalized term reads like a person's name or like
//! domain vocabulary (a clinical specialty, a document type). The verdict
//! only tunes how strict scoring is; it never blocks a search.

use super::normalizer::normalize;
use crate::config::ClassifierConfig;
use crate::error::AppError;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    PersonName,
    DomainTerm,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::PersonName => "person_name",
            QueryKind::DomainTerm => "domain_term",
        }
    }
}

/// Which rule produced the verdict (first match wins, in this order)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierRule {
    DeniedTerm,
    DomainPattern,
    NameStructure,
    NameToken,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: QueryKind,
    pub rule: ClassifierRule,
}

impl Classification {
    fn name(rule: ClassifierRule) -> Self {
        Self {
            kind: QueryKind::PersonName,
            rule,
        }
    }

    fn domain(rule: ClassifierRule) -> Self {
        Self {
            kind: QueryKind::DomainTerm,
            rule,
        }
    }

    pub fn looks_like_name(&self) -> bool {
        self.kind == QueryKind::PersonName
    }
}

/// Rule-based name/domain classifier built from swappable vocabulary
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    denied: HashSet<String>,
    patterns: Vec<Regex>,
    connectives: HashSet<String>,
}

impl QueryClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, AppError> {
        let patterns = config
            .domain_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    AppError::Config(format!("Invalid classifier pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Vocabulary goes through the same normalizer as queries
        let normalized_set = |items: &[String]| -> HashSet<String> {
            items
                .iter()
                .map(|s| normalize(s).into_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Ok(Self {
            denied: normalized_set(&config.domain_terms),
            patterns,
            connectives: normalized_set(&config.connectives),
        })
    }

    pub fn classify(&self, term: &str) -> Classification {
        if self.denied.contains(term) {
            return Classification::domain(ClassifierRule::DeniedTerm);
        }

        if self.patterns.iter().any(|p| p.is_match(term)) {
            return Classification::domain(ClassifierRule::DomainPattern);
        }

        let tokens: Vec<&str> = term.split_whitespace().collect();
        if term.contains(',')
            || tokens.len() > 1
            || tokens.iter().any(|t| self.connectives.contains(*t))
        {
            return Classification::name(ClassifierRule::NameStructure);
        }

        if term.graphemes(true).count() >= 2 && term.chars().all(char::is_alphabetic) {
            return Classification::name(ClassifierRule::NameToken);
        }

        Classification::name(ClassifierRule::Fallback)
    }
}
