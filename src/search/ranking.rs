//! Ranking & Scoring System
//!
//! Scores one candidate name against a normalized query. Each signal is an
//! independent function returning `Option<MatchScore>`; the scorer keeps the
//! best one, then applies the domain-term gate and the real-connection check.

use super::classifier::QueryKind;
use super::fuzzy::{char_len, compact_similarity, length_ratio, name_words, similarity, MatchType};
use crate::config::check_unit_range;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Tunable scorer constants. All of them were tuned empirically and can be
/// overridden from the `scoring` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Whole-string edit ratio accepted as-is for name-like queries
    pub edit_accept_name: f64,
    /// Damping applied to name-like edit ratios below the acceptance bar
    pub edit_damp_name: f64,
    /// Minimum edit ratio considered at all for domain terms
    pub edit_accept_domain: f64,
    pub edit_damp_domain: f64,
    /// Whole-string prefix multiplier
    pub prefix_weight: f64,
    /// Whole-string substring multiplier
    pub substring_weight: f64,
    /// Per-token quality below this does not count as a matched token
    pub token_match_min: f64,
    pub token_prefix_cap: f64,
    pub token_substring_cap: f64,
    /// Shortest shared run (chars) that counts as a token substring match
    pub min_overlap: usize,
    /// Fuzzy ratio needed for a single query token to match a name word
    pub word_fuzzy_min: f64,
    pub word_prefix_min_len: usize,
    /// Prefixes up to this many chars get `short_prefix_boost`
    pub short_prefix_max_len: usize,
    pub short_prefix_boost: f64,
    pub word_weights: WordMatchWeights,
    /// Scores below this need a real connection to survive
    pub connection_floor: f64,
    pub connection_token_similarity: f64,
    pub connection_prefix_min_len: usize,
    pub connection_inner_min_len: usize,
    /// Whole-name similarity a domain-term query requires of any candidate
    pub domain_min_similarity: f64,
}

/// Multipliers for the single-token-vs-full-name signal, by match kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordMatchWeights {
    pub exact: f64,
    pub fuzzy: f64,
    pub prefix: f64,
    pub substring: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            edit_accept_name: 0.6,
            edit_damp_name: 0.7,
            edit_accept_domain: 0.8,
            edit_damp_domain: 0.5,
            prefix_weight: 0.9,
            substring_weight: 0.8,
            token_match_min: 0.65,
            token_prefix_cap: 0.85,
            token_substring_cap: 0.75,
            min_overlap: 3,
            word_fuzzy_min: 0.7,
            word_prefix_min_len: 3,
            short_prefix_max_len: 4,
            short_prefix_boost: 0.1,
            word_weights: WordMatchWeights::default(),
            connection_floor: 0.5,
            connection_token_similarity: 0.8,
            connection_prefix_min_len: 3,
            connection_inner_min_len: 4,
            domain_min_similarity: 0.9,
        }
    }
}

impl Default for WordMatchWeights {
    fn default() -> Self {
        Self {
            exact: 1.0,
            fuzzy: 0.95,
            prefix: 0.9,
            substring: 0.8,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), AppError> {
        let w = &self.word_weights;
        for (field, value) in [
            ("scoring.edit_accept_name", self.edit_accept_name),
            ("scoring.edit_damp_name", self.edit_damp_name),
            ("scoring.edit_accept_domain", self.edit_accept_domain),
            ("scoring.edit_damp_domain", self.edit_damp_domain),
            ("scoring.prefix_weight", self.prefix_weight),
            ("scoring.substring_weight", self.substring_weight),
            ("scoring.token_match_min", self.token_match_min),
            ("scoring.token_prefix_cap", self.token_prefix_cap),
            ("scoring.token_substring_cap", self.token_substring_cap),
            ("scoring.word_fuzzy_min", self.word_fuzzy_min),
            ("scoring.short_prefix_boost", self.short_prefix_boost),
            ("scoring.word_weights.exact", w.exact),
            ("scoring.word_weights.fuzzy", w.fuzzy),
            ("scoring.word_weights.prefix", w.prefix),
            ("scoring.word_weights.substring", w.substring),
            ("scoring.connection_floor", self.connection_floor),
            ("scoring.connection_token_similarity", self.connection_token_similarity),
            ("scoring.domain_min_similarity", self.domain_min_similarity),
        ] {
            check_unit_range(value, field)?;
        }

        if self.min_overlap == 0 {
            return Err(AppError::Config(
                "scoring.min_overlap must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A candidate's similarity and the signal that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub score: f64,
    pub match_type: MatchType,
}

impl MatchScore {
    fn new(score: f64, match_type: MatchType) -> Self {
        Self { score, match_type }
    }

    pub fn exact() -> Self {
        Self::new(1.0, MatchType::Exact)
    }
}

/// Per-word outcome for the single-token signal. Variant order is priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum WordMatch {
    Substring,
    Prefix,
    Fuzzy,
    Exact,
}

/// Multi-signal name scorer
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    weights: ScoringWeights,
}

impl SimilarityScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score `name` against `term`. Both must already be normalized.
    /// Returns `None` when the candidate is rejected outright.
    pub fn score(&self, term: &str, name: &str, kind: QueryKind) -> Option<MatchScore> {
        if term.is_empty() || name.is_empty() {
            return None;
        }
        if term == name {
            return Some(MatchScore::exact());
        }

        let w = &self.weights;
        if kind == QueryKind::DomainTerm && similarity(term, name) < w.domain_min_similarity {
            return None;
        }

        let signals = [
            self.whole_prefix(term, name),
            self.whole_substring(term, name),
            self.single_token(term, name),
            self.token_overlap(term, name),
            self.edit_ratio(term, name, kind),
            Some(self.char_ratio(term, name)),
        ];

        // first signal wins ties, so order above doubles as label priority
        let best = signals
            .into_iter()
            .flatten()
            .fold(MatchScore::new(0.0, MatchType::Unknown), |best, s| {
                if s.score > best.score {
                    s
                } else {
                    best
                }
            });

        if best.score < w.connection_floor && !self.has_real_connection(term, name) {
            return None;
        }

        Some(MatchScore::new(best.score.clamp(0.0, 1.0), best.match_type))
    }

    fn whole_prefix(&self, term: &str, name: &str) -> Option<MatchScore> {
        name.starts_with(term).then(|| {
            MatchScore::new(
                length_ratio(term, name) * self.weights.prefix_weight,
                MatchType::Prefix,
            )
        })
    }

    fn whole_substring(&self, term: &str, name: &str) -> Option<MatchScore> {
        name.contains(term).then(|| {
            MatchScore::new(
                length_ratio(term, name) * self.weights.substring_weight,
                MatchType::Substring,
            )
        })
    }

    /// One query token against each word of a multi-word name
    fn single_token(&self, term: &str, name: &str) -> Option<MatchScore> {
        let query = name_words(term);
        let words = name_words(name);
        if query.len() != 1 || words.len() < 2 {
            return None;
        }
        let query = query[0];
        let w = &self.weights;
        let query_len = char_len(query);

        let mut best: Option<(WordMatch, f64)> = None;
        for word in words {
            if word == query {
                return Some(MatchScore::new(w.word_weights.exact, MatchType::Exact));
            }

            let ratio = similarity(query, word);
            let outcome = if ratio >= w.word_fuzzy_min {
                Some((WordMatch::Fuzzy, ratio))
            } else if query_len >= w.word_prefix_min_len && word.starts_with(query) {
                let mut raw = length_ratio(query, word);
                if query_len <= w.short_prefix_max_len {
                    raw += w.short_prefix_boost;
                }
                Some((WordMatch::Prefix, raw.min(w.token_prefix_cap)))
            } else if query_len >= w.word_prefix_min_len && word.contains(query) {
                Some((
                    WordMatch::Substring,
                    length_ratio(query, word).min(w.token_substring_cap),
                ))
            } else {
                None
            };

            if let Some(candidate) = outcome {
                let better = match best {
                    None => true,
                    Some((kind, raw)) => {
                        candidate.0 > kind || (candidate.0 == kind && candidate.1 > raw)
                    }
                };
                if better {
                    best = Some(candidate);
                }
            }
        }

        best.map(|(kind, raw)| match kind {
            WordMatch::Exact => MatchScore::new(raw * w.word_weights.exact, MatchType::Exact),
            WordMatch::Fuzzy => MatchScore::new(raw * w.word_weights.fuzzy, MatchType::Fuzzy),
            WordMatch::Prefix => MatchScore::new(raw * w.word_weights.prefix, MatchType::Prefix),
            WordMatch::Substring => {
                MatchScore::new(raw * w.word_weights.substring, MatchType::Substring)
            }
        })
    }

    /// Average best-match quality of each query token across name tokens
    fn token_overlap(&self, term: &str, name: &str) -> Option<MatchScore> {
        let query = name_words(term);
        let words = name_words(name);
        if query.is_empty() || words.is_empty() || (query.len() < 2 && words.len() < 2) {
            return None;
        }

        let w = &self.weights;
        let mut total = 0.0;
        let mut exact = 0;
        let mut any_prefix = false;
        let mut any_substring = false;

        for q in &query {
            let mut best = (0.0, MatchType::Unknown);
            for word in &words {
                let quality = self.token_quality(q, word);
                if quality.0 > best.0 {
                    best = quality;
                }
            }
            if best.0 < w.token_match_min {
                continue;
            }

            total += best.0;
            match best.1 {
                MatchType::Exact => exact += 1,
                MatchType::Prefix => any_prefix = true,
                MatchType::Substring => any_substring = true,
                _ => {}
            }
        }

        if total == 0.0 {
            return None;
        }

        let match_type = if exact == query.len() {
            MatchType::Exact
        } else if any_substring {
            MatchType::Substring
        } else if any_prefix {
            MatchType::Prefix
        } else {
            MatchType::Fuzzy
        };
        Some(MatchScore::new(total / query.len() as f64, match_type))
    }

    fn token_quality(&self, q: &str, word: &str) -> (f64, MatchType) {
        let w = &self.weights;
        if q == word {
            return (1.0, MatchType::Exact);
        }
        if word.starts_with(q) {
            // the floor applies from `word_prefix_min_len` chars up
            let ratio = length_ratio(q, word);
            let raw = if char_len(q) >= w.word_prefix_min_len {
                ratio.max(w.token_match_min)
            } else {
                ratio
            };
            return (raw.min(w.token_prefix_cap), MatchType::Prefix);
        }

        let (short, long) = if char_len(q) <= char_len(word) {
            (q, word)
        } else {
            (word, q)
        };
        if char_len(short) >= w.min_overlap && long.contains(short) {
            let raw = length_ratio(short, long).min(w.token_substring_cap);
            return (raw, MatchType::Substring);
        }

        (0.0, MatchType::Unknown)
    }

    fn edit_ratio(&self, term: &str, name: &str, kind: QueryKind) -> Option<MatchScore> {
        let w = &self.weights;
        let ratio = similarity(term, name);
        let score = match kind {
            QueryKind::PersonName if ratio >= w.edit_accept_name => ratio,
            QueryKind::PersonName => ratio * w.edit_damp_name,
            QueryKind::DomainTerm if ratio >= w.edit_accept_domain => ratio * w.edit_damp_domain,
            QueryKind::DomainTerm => return None,
        };
        Some(MatchScore::new(score, MatchType::Fuzzy))
    }

    fn char_ratio(&self, term: &str, name: &str) -> MatchScore {
        MatchScore::new(compact_similarity(term, name), MatchType::Fuzzy)
    }

    /// Minimum literal evidence a low-scoring candidate needs to survive
    fn has_real_connection(&self, term: &str, name: &str) -> bool {
        let w = &self.weights;
        if name.contains(term) {
            return true;
        }

        let term_len = char_len(term);
        name_words(name).into_iter().any(|word| {
            (term_len >= w.connection_prefix_min_len && word.starts_with(term))
                || similarity(term, word) >= w.connection_token_similarity
                || (term_len >= w.connection_inner_min_len && word.contains(term))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(term: &str, name: &str) -> Option<MatchScore> {
        SimilarityScorer::default().score(term, name, QueryKind::PersonName)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_exact_short_circuits() {
        let s = score("GARCIA, ANA", "GARCIA, ANA").unwrap();
        assert_eq!(s, MatchScore::exact());

        // exact even for domain vocabulary
        let s = SimilarityScorer::default()
            .score("CARDIOLOGIA", "CARDIOLOGIA", QueryKind::DomainTerm)
            .unwrap();
        assert_eq!(s.match_type, MatchType::Exact);
    }

    #[test]
    fn test_exact_word_inside_full_name() {
        let s = score("GARCIA", "GARCIA LOPEZ, MARIA").unwrap();
        assert_eq!(s.score, 1.0);
        assert_eq!(s.match_type, MatchType::Exact);

        let s = score("GARCIA", "GARCIA, ANA").unwrap();
        assert_eq!(s.match_type, MatchType::Exact);
    }

    #[test]
    fn test_short_prefix_of_surname() {
        let s = score("MAR", "MARTINEZ, JUAN").unwrap();
        assert!(approx(s.score, 0.65), "{:?}", s);
        assert_eq!(s.match_type, MatchType::Prefix);
    }

    #[test]
    fn test_one_letter_is_not_a_token_prefix() {
        let pairs = [
            ("M", "MARTINEZ, JUAN"),
            ("J", "MARTINEZ, JUAN"),
            ("MA", "GARCIA LOPEZ, MARIA"),
        ];
        for (term, name) in pairs {
            if let Some(s) = score(term, name) {
                assert!(s.score < 0.3, "{} vs {}: {:?}", term, name, s);
                assert_ne!(s.match_type, MatchType::Prefix, "{} vs {}", term, name);
            }
        }
    }

    #[test]
    fn test_typo_in_word_is_fuzzy() {
        let s = score("GARSIA", "GARCIA, ANA").unwrap();
        assert_eq!(s.match_type, MatchType::Fuzzy);
        assert!(s.score > 0.75 && s.score < 0.8, "{:?}", s);
    }

    #[test]
    fn test_substring_inside_word_survives_on_connection() {
        let s = score("ANA", "SUSANA PEREZ").unwrap();
        assert_eq!(s.match_type, MatchType::Substring);
        assert!(approx(s.score, 0.4), "{:?}", s);
    }

    #[test]
    fn test_unrelated_names_rejected() {
        assert!(score("ZZZQQQ", "MARTINEZ, JUAN").is_none());
        assert!(score("GARCIA", "MARTINEZ, JUAN").is_none());
        assert!(score("PEDRO", "PAOLA RUIZ").is_none());
    }

    #[test]
    fn test_multi_word_query() {
        let s = score("GARCIA MARIA", "GARCIA LOPEZ, MARIA").unwrap();
        assert_eq!(s.score, 1.0);
        assert_eq!(s.match_type, MatchType::Exact);

        let s = score("GARCIA PEDRO", "GARCIA LOPEZ, MARIA").unwrap();
        assert!(s.score >= 0.5 && s.score < 1.0, "{:?}", s);
    }

    #[test]
    fn test_domain_term_needs_near_identical_name() {
        let scorer = SimilarityScorer::default();
        assert!(scorer
            .score("CARDIOLOGIA", "CARDIOLOGIA INFANTIL", QueryKind::DomainTerm)
            .is_none());
        assert!(scorer
            .score("CARDIOLOGIA", "CARDENAS, LOGAN", QueryKind::DomainTerm)
            .is_none());

        let s = scorer
            .score("CARDIOLOGIA", "CARDIOLOGA", QueryKind::DomainTerm)
            .unwrap();
        assert!(s.score >= 0.9);
    }

    #[test]
    fn test_same_pair_is_stricter_for_domain_terms() {
        let scorer = SimilarityScorer::default();
        let as_name = scorer.score("MAR", "MARTINEZ, JUAN", QueryKind::PersonName);
        let as_domain = scorer.score("MAR", "MARTINEZ, JUAN", QueryKind::DomainTerm);
        assert!(as_name.is_some());
        assert!(as_domain.is_none());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(score("", "GARCIA").is_none());
        assert!(score("GARCIA", "").is_none());
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        for (term, name) in [
            ("A", "ANA"),
            ("MARIA JOSE", "JOSE MARIA"),
            ("DE LA CRUZ", "CRUZ, PEDRO DE LA"),
            ("LOPEZ", "LOPEZ-GARCIA, ANA"),
        ] {
            if let Some(s) = score(term, name) {
                assert!((0.0..=1.0).contains(&s.score), "{} / {}: {:?}", term, name, s);
            }
        }
    }

    #[test]
    fn test_weights_are_overridable() {
        let weights = ScoringWeights {
            token_prefix_cap: 0.7,
            token_match_min: 0.7,
            ..ScoringWeights::default()
        };
        let s = SimilarityScorer::new(weights)
            .score("MAR", "MARTINEZ, JUAN", QueryKind::PersonName)
            .unwrap();
        assert!(approx(s.score, 0.7), "{:?}", s);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(ScoringWeights::default().validate().is_ok());

        let weights = ScoringWeights {
            connection_floor: 1.2,
            ..ScoringWeights::default()
        };
        let err = weights.validate().unwrap_err();
        assert!(err.message().contains("scoring.connection_floor"));

        let weights = ScoringWeights {
            min_overlap: 0,
            ..ScoringWeights::default()
        };
        assert!(weights.validate().is_err());
    }
}
