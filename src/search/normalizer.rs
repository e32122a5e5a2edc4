//! Query Normalizer
//!
//! Canonicalizes raw name text so queries and stored names compare on the
//! same footing: NFC composition, uppercase, collapsed whitespace, and only
//! letters, digits, spaces, commas and internal hyphens retained.

use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Canonical form of a search term or candidate name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NormalizedTerm(String);

impl NormalizedTerm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-separated tokens
    pub fn tokens(&self) -> Vec<&str> {
        self.0.split(' ').filter(|t| !t.is_empty()).collect()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedTerm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize raw text. Never fails; an all-punctuation input yields an
/// empty term.
pub fn normalize(raw: &str) -> NormalizedTerm {
    let chars: Vec<char> = raw.nfc().collect();
    let mut out = String::with_capacity(raw.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            out.push(' ');
        } else if c.is_alphanumeric() || c == ',' {
            out.extend(c.to_uppercase());
        } else if c == '-' && is_internal_hyphen(&chars, i) {
            out.push('-');
        }
    }

    NormalizedTerm(out.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn is_internal_hyphen(chars: &[char], i: usize) -> bool {
    let before = i.checked_sub(1).and_then(|j| chars.get(j));
    let after = chars.get(i + 1);
    before.is_some_and(|c| c.is_alphanumeric()) && after.is_some_and(|c| c.is_alphanumeric())
}
