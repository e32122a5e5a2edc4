//! String similarity primitives
//!
//! Edit-distance ratios via strsim plus the token helpers the scorer
//! shares. Lengths are measured in chars, not bytes, so accented names
//! score the same as their ASCII spellings would.

use serde::{Deserialize, Serialize};

/// Which signal produced a candidate's winning score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
    Unknown,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Prefix => "prefix",
            MatchType::Substring => "substring",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Unknown => "unknown",
        }
    }
}

/// Normalized Levenshtein similarity in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Similarity of both strings with all spaces removed
pub fn compact_similarity(a: &str, b: &str) -> f64 {
    similarity(&strip_spaces(a), &strip_spaces(b))
}

pub fn strip_spaces(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// `part` length over `whole` length, 0 when `whole` is empty
pub fn length_ratio(part: &str, whole: &str) -> f64 {
    let whole = char_len(whole);
    if whole == 0 {
        return 0.0;
    }
    char_len(part) as f64 / whole as f64
}

/// Name tokens with surrounding punctuation ("GARCIA," -> "GARCIA"),
/// dropping tokens that were punctuation only
pub fn name_words(name: &str) -> Vec<&str> {
    name.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("GARCIA", "GARCIA"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("ABC", ""), 0.0);
        let s = similarity("GARCIA", "GARSIA");
        assert!(s > 0.8 && s < 1.0);
    }

    #[test]
    fn test_similarity_counts_chars() {
        // one substitution in six chars regardless of byte width
        let ascii = similarity("NUNEZA", "NUNEZE");
        let accented = similarity("NÚÑEZA", "NÚÑEZE");
        assert!((ascii - accented).abs() < 1e-9);
    }

    #[test]
    fn test_compact_similarity_ignores_spaces() {
        assert_eq!(compact_similarity("DE LA CRUZ", "DELACRUZ"), 1.0);
    }

    #[test]
    fn test_length_ratio() {
        assert!((length_ratio("MAR", "MARIA") - 0.6).abs() < 1e-9);
        assert!((length_ratio("Ñ", "ÑA") - 0.5).abs() < 1e-9);
        assert_eq!(length_ratio("A", ""), 0.0);
    }

    #[test]
    fn test_name_words() {
        assert_eq!(
            name_words("GARCIA LOPEZ, MARIA"),
            vec!["GARCIA", "LOPEZ", "MARIA"]
        );
        assert_eq!(name_words("PEREZ , ANA-LUZ"), vec!["PEREZ", "ANA-LUZ"]);
        assert!(name_words("").is_empty());
    }

    #[test]
    fn test_match_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MatchType::Substring).unwrap(), "\"substring\"");
        assert_eq!(MatchType::Fuzzy.as_str(), "fuzzy");
    }
}
