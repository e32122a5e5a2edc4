//! Candidate Retriever
//!
//! Runs the anchored strategies (exact, prefix, substring) concurrently,
//! merges them by record id and, when that finds too little for a name-like
//! query, adds a bounded scan of recent records so typo'd and transposed
//! names still reach the scorer.

use crate::config::RetrievalConfig;
use crate::error::AppError;
use crate::store::{Record, RecordStore, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Retrieval strategy that surfaced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactMatch,
    PrefixMatch,
    SubstringMatch,
    FuzzyScan,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ExactMatch => "exact_match",
            Strategy::PrefixMatch => "prefix_match",
            Strategy::SubstringMatch => "substring_match",
            Strategy::FuzzyScan => "fuzzy_scan",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievedCandidate {
    pub record: Record,
    /// First strategy that returned this record. Diagnostic only.
    pub found_by: Strategy,
}

/// Deduplicated candidates plus a report of how retrieval went
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub candidates: Vec<RetrievedCandidate>,
    /// Strategies that ran and succeeded, in merge order
    pub strategies_used: Vec<Strategy>,
    /// Strategies that failed, with the store's reason
    pub degraded: Vec<(Strategy, String)>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    fn absorb(
        &mut self,
        seen: &mut HashSet<String>,
        strategy: Strategy,
        outcome: Result<Vec<Record>, StoreError>,
        scope: Option<&str>,
    ) {
        match outcome {
            Ok(records) => {
                let before = self.candidates.len();
                for record in records {
                    if !record.in_scope(scope) || !seen.insert(record.id.clone()) {
                        continue;
                    }
                    self.candidates.push(RetrievedCandidate {
                        record,
                        found_by: strategy,
                    });
                }
                debug!(
                    strategy = strategy.as_str(),
                    added = self.candidates.len() - before,
                    "retrieval strategy finished"
                );
                self.strategies_used.push(strategy);
            }
            Err(e) => {
                warn!(strategy = strategy.as_str(), error = %e, "retrieval strategy failed");
                self.degraded.push((strategy, e.to_string()));
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateRetriever {
    config: RetrievalConfig,
}

impl CandidateRetriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    /// Collect candidates for a normalized term.
    ///
    /// Fails with `RetrievalUnavailable` only when every strategy that ran
    /// failed; partial failure is logged and recorded in `degraded`.
    pub async fn retrieve<S: RecordStore>(
        &self,
        store: &S,
        term: &str,
        scope: Option<&str>,
        looks_like_name: bool,
    ) -> Result<CandidateSet, AppError> {
        let cfg = &self.config;
        let (exact, prefix, substring) = tokio::join!(
            store.find_by_exact_name(term, scope, cfg.exact_limit),
            store.find_by_prefix(term, scope, cfg.prefix_limit),
            store.find_by_contains(term, scope, cfg.substring_limit),
        );

        let mut set = CandidateSet::default();
        let mut seen = HashSet::new();
        set.absorb(&mut seen, Strategy::ExactMatch, exact, scope);
        set.absorb(&mut seen, Strategy::PrefixMatch, prefix, scope);
        set.absorb(&mut seen, Strategy::SubstringMatch, substring, scope);

        if set.len() < cfg.fallback_trigger && looks_like_name {
            let recent = store.find_recent(true, scope, cfg.fallback_limit).await;
            set.absorb(&mut seen, Strategy::FuzzyScan, recent, scope);
        }

        if set.strategies_used.is_empty() {
            let reasons: Vec<String> = set
                .degraded
                .iter()
                .map(|(s, reason)| format!("{}: {}", s.as_str(), reason))
                .collect();
            return Err(AppError::RetrievalUnavailable(reasons.join("; ")));
        }

        if set.is_degraded() {
            warn!(
                failed = set.degraded.len(),
                candidates = set.len(),
                "retrieval degraded, continuing with partial candidates"
            );
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::test_support::{FailingStore, FlakyStore};
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::new(vec![
            Record::new("1", "GARCIA LOPEZ, MARIA").with_owner("a"),
            Record::new("2", "MARTINEZ, JUAN").with_owner("a"),
            Record::new("3", "GARCIA, ANA").with_owner("b"),
            Record::new("4", "PEREZ, LUIS").with_owner("a").with_name_valid(false),
        ])
    }

    fn ids(set: &CandidateSet) -> Vec<&str> {
        set.candidates.iter().map(|c| c.record.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_dedupes_and_keeps_first_strategy() {
        let retriever = CandidateRetriever::default();
        let set = retriever.retrieve(&store(), "GARCIA, ANA", None, true).await.unwrap();

        let first = &set.candidates[0];
        assert_eq!(first.record.id, "3");
        assert_eq!(first.found_by, Strategy::ExactMatch);

        let unique: HashSet<&str> = ids(&set).into_iter().collect();
        assert_eq!(unique.len(), set.len());
    }

    #[tokio::test]
    async fn test_fallback_scan_for_names_only() {
        let retriever = CandidateRetriever::default();

        let set = retriever.retrieve(&store(), "GRACIA", None, true).await.unwrap();
        assert!(set.strategies_used.contains(&Strategy::FuzzyScan));
        // the scan only returns records with a valid name
        assert!(!ids(&set).contains(&"4"));
        assert!(ids(&set).contains(&"1"));

        let set = retriever.retrieve(&store(), "GRACIA", None, false).await.unwrap();
        assert!(!set.strategies_used.contains(&Strategy::FuzzyScan));
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_enough_candidates() {
        let config = RetrievalConfig {
            fallback_trigger: 1,
            ..RetrievalConfig::default()
        };
        let set = CandidateRetriever::new(config)
            .retrieve(&store(), "GARCIA", None, true)
            .await
            .unwrap();
        assert!(!set.strategies_used.contains(&Strategy::FuzzyScan));
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_scope_applied_to_every_strategy() {
        let set = CandidateRetriever::default()
            .retrieve(&store(), "GARCIA", Some("a"), true)
            .await
            .unwrap();
        assert!(set.candidates.iter().all(|c| c.record.owner.as_deref() == Some("a")));
        assert!(!ids(&set).contains(&"3"));
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let err = CandidateRetriever::default()
            .retrieve(&FailingStore, "GARCIA", None, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RetrievalUnavailable(_)));
        assert!(err.message().contains("exact_match"));
    }

    #[tokio::test]
    async fn test_partial_failure_degrades() {
        let flaky = FlakyStore::new(store(), &[Strategy::PrefixMatch, Strategy::SubstringMatch]);
        let set = CandidateRetriever::default()
            .retrieve(&flaky, "GARCIA, ANA", None, true)
            .await
            .unwrap();

        assert!(set.is_degraded());
        assert_eq!(set.degraded.len(), 2);
        assert!(set.strategies_used.contains(&Strategy::ExactMatch));
        assert!(ids(&set).contains(&"3"));
    }
}
