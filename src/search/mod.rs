//! Patient-name fuzzy search
//!
//! Pipeline: normalize → classify → retrieve → score → rank/page. The
//! suggestion path skips classification and scoring and only uses the
//! prefix strategy.

pub mod classifier;
pub mod engine;
pub mod fuzzy;
pub mod normalizer;
pub mod paginate;
pub mod ranking;
pub mod retriever;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{Classification, QueryClassifier, QueryKind};
pub use engine::{Candidate, SearchEngine, SearchQuery, SearchResult, SuggestionResult};
pub use fuzzy::MatchType;
pub use normalizer::{normalize, NormalizedTerm};
pub use paginate::Pagination;
pub use ranking::{MatchScore, ScoringWeights, SimilarityScorer};
pub use retriever::{CandidateRetriever, CandidateSet, Strategy};
