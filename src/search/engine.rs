//! Search Engine Integration
//!
//! Ties together normalization, classification, retrieval, scoring and
//! pagination. One engine is built at startup and shared by every request;
//! it holds no mutable state, so concurrent searches need no locking.

use super::classifier::{QueryClassifier, QueryKind};
use super::fuzzy::MatchType;
use super::normalizer::normalize;
use super::paginate::{rank_and_page, Pagination};
use super::ranking::{MatchScore, SimilarityScorer};
use super::retriever::{CandidateRetriever, Strategy};
use crate::config::{EngineConfig, SearchDefaults};
use crate::error::AppError;
use crate::store::{Record, RecordStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// A single search request. `None` fields take the engine's configured
/// defaults.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub term: String,
    pub scope: Option<String>,
    pub limit: Option<usize>,
    pub skip: usize,
    pub min_similarity: Option<f64>,
    pub include_score: bool,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scope: None,
            limit: None,
            skip: 0,
            min_similarity: None,
            include_score: true,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = Some(min_similarity);
        self
    }

    pub fn with_include_score(mut self, include_score: bool) -> Self {
        self.include_score = include_score;
        self
    }
}

/// A matched record with its score. Serializes as the record's own fields
/// plus `similarity_score` and `match_type`.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(skip)]
    pub found_by: Strategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub search_term: String,
    pub normalized_term: String,
    pub query_kind: QueryKind,
    pub documents: Vec<Candidate>,
    /// Matches above the threshold, before pagination
    pub total_found: usize,
    pub limit: usize,
    pub skip: usize,
    pub pagination: Pagination,
    pub strategies_used: Vec<Strategy>,
    pub threshold_used: f64,
    pub search_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResult {
    pub partial_term: String,
    pub suggestions: Vec<String>,
    pub total_suggestions: usize,
    pub limit: usize,
}

/// Patient-name search engine over a record store
pub struct SearchEngine<S> {
    store: S,
    classifier: QueryClassifier,
    retriever: CandidateRetriever,
    scorer: SimilarityScorer,
    defaults: SearchDefaults,
    suggestion_overfetch: usize,
}

impl<S: RecordStore> SearchEngine<S> {
    pub fn new(store: S, config: &EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            store,
            classifier: QueryClassifier::new(&config.classifier)?,
            retriever: CandidateRetriever::new(config.retrieval.clone()),
            scorer: SimilarityScorer::new(config.scoring.clone()),
            defaults: config.defaults.clone(),
            suggestion_overfetch: config.retrieval.suggestion_overfetch,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn defaults(&self) -> &SearchDefaults {
        &self.defaults
    }

    /// Full fuzzy search: retrieve, score, filter by threshold, rank, page.
    ///
    /// Zero matches is a successful empty result. Fails only when the store
    /// could not serve any retrieval strategy.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, AppError> {
        let started = Instant::now();
        let limit = query.limit.unwrap_or(self.defaults.limit);
        let threshold = query.min_similarity.unwrap_or(self.defaults.min_similarity);
        let scope = query.scope.as_deref();

        let term = normalize(&query.term);
        let classification = self.classifier.classify(term.as_str());
        debug!(
            term = %term,
            kind = classification.kind.as_str(),
            rule = ?classification.rule,
            "classified query"
        );

        let set = self
            .retriever
            .retrieve(
                &self.store,
                term.as_str(),
                scope,
                classification.looks_like_name(),
            )
            .await?;
        let retrieved = set.len();

        let mut scored: Vec<(Candidate, MatchScore)> = Vec::with_capacity(retrieved);
        for candidate in set.candidates {
            let Some(raw_name) = candidate.record.name() else {
                debug!(id = %candidate.record.id, "skipping record without a name");
                continue;
            };
            let name = normalize(raw_name);
            let Some(score) = self
                .scorer
                .score(term.as_str(), name.as_str(), classification.kind)
            else {
                continue;
            };

            scored.push((
                Candidate {
                    record: candidate.record,
                    similarity_score: None,
                    match_type: None,
                    found_by: candidate.found_by,
                },
                score,
            ));
        }

        let (page, total_found) =
            rank_and_page(scored, |(_, s)| s.score, threshold, limit, query.skip);

        let documents: Vec<Candidate> = page
            .into_iter()
            .map(|(mut candidate, score)| {
                if query.include_score {
                    candidate.similarity_score = Some(score.score);
                    candidate.match_type = Some(score.match_type);
                }
                candidate
            })
            .collect();

        info!(
            term = %term,
            retrieved,
            total_found,
            returned = documents.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search completed"
        );

        Ok(SearchResult {
            search_term: query.term.clone(),
            normalized_term: term.into_string(),
            query_kind: classification.kind,
            documents,
            total_found,
            limit,
            skip: query.skip,
            pagination: Pagination::new(total_found, limit, query.skip),
            strategies_used: set.strategies_used,
            threshold_used: threshold,
            search_timestamp: Utc::now(),
        })
    }

    /// Prefix-only autocomplete over stored names, no scoring
    pub async fn suggest(
        &self,
        partial_term: &str,
        scope: Option<&str>,
        limit: Option<usize>,
    ) -> Result<SuggestionResult, AppError> {
        let limit = limit.unwrap_or(self.defaults.suggestion_limit);
        let term = normalize(partial_term);

        let mut suggestions = Vec::new();
        if !term.is_empty() {
            let records = self
                .store
                .find_by_prefix(
                    term.as_str(),
                    scope,
                    limit.saturating_mul(self.suggestion_overfetch),
                )
                .await?;

            let mut seen = HashSet::new();
            for record in &records {
                if suggestions.len() >= limit {
                    break;
                }
                if !record.in_scope(scope) {
                    continue;
                }
                let Some(name) = record.name() else {
                    continue;
                };
                if normalize(name).as_str().starts_with(term.as_str()) && seen.insert(name) {
                    suggestions.push(name.to_string());
                }
            }
        }

        debug!(term = %term, found = suggestions.len(), "suggestions built");

        Ok(SuggestionResult {
            partial_term: partial_term.to_string(),
            total_suggestions: suggestions.len(),
            suggestions,
            limit,
        })
    }

    /// Documents belonging to one patient: the full search pipeline with the
    /// strict patient threshold applied before pagination
    pub async fn documents_for_patient(
        &self,
        name: &str,
        scope: Option<&str>,
        limit: Option<usize>,
        skip: usize,
    ) -> Result<SearchResult, AppError> {
        let mut query = SearchQuery::new(name)
            .with_skip(skip)
            .with_min_similarity(self.defaults.patient_min_similarity);
        query.scope = scope.map(str::to_string);
        query.limit = limit;

        self.search(&query).await
    }
}
