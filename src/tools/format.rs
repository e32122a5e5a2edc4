//! Markdown rendering for tool results

use crate::search::{Candidate, QueryKind, SearchResult, SuggestionResult};
use serde_json::Value;
use std::fmt::Write;

/// Render search results as markdown, one section per document
pub fn format_search_result(result: &SearchResult, title: &str) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# {} \"{}\"\n", title, result.search_term.trim());

    let kind = match result.query_kind {
        QueryKind::PersonName => "person name",
        QueryKind::DomainTerm => "domain term",
    };

    if result.total_found == 0 {
        let _ = writeln!(
            md,
            "No documents matched `{}` ({}, threshold {:.2}).",
            result.normalized_term, kind, result.threshold_used
        );
        return md;
    }

    let _ = writeln!(
        md,
        "Found **{}** matching documents for `{}` ({}, threshold {:.2}).",
        result.total_found, result.normalized_term, kind, result.threshold_used
    );

    if result.documents.is_empty() {
        let _ = writeln!(
            md,
            "\nNo documents on this page (skip {}, page {} of {}).",
            result.skip, result.pagination.page, result.pagination.total_pages
        );
        return md;
    }

    let first = result.skip + 1;
    let last = result.skip + result.documents.len();
    let _ = writeln!(
        md,
        "Showing {}-{}, page {} of {}.",
        first, last, result.pagination.page, result.pagination.total_pages
    );

    for (i, doc) in result.documents.iter().enumerate() {
        md.push('\n');
        format_candidate(&mut md, first + i, doc);
    }

    if result.pagination.has_next {
        let _ = writeln!(
            md,
            "\n_More results available: use skip {}._",
            result.skip + result.limit
        );
    }

    md
}

fn format_candidate(md: &mut String, position: usize, doc: &Candidate) {
    let record = &doc.record;
    let _ = writeln!(md, "## {}. {}", position, record.name().unwrap_or("(no name)"));
    let _ = writeln!(md, "- **ID:** {}", record.id);

    if let (Some(score), Some(match_type)) = (doc.similarity_score, doc.match_type) {
        let _ = writeln!(md, "- **Score:** {:.2} ({})", score, match_type.as_str());
    }
    if let Some(owner) = &record.owner {
        let _ = writeln!(md, "- **Owner:** {}", owner);
    }
    let _ = writeln!(md, "- **Created:** {}", record.created_at.to_rfc3339());

    for (key, value) in &record.payload {
        if let Some(text) = scalar_text(value) {
            let _ = writeln!(md, "- **{}:** {}", key, text);
        }
    }
}

/// Scalar payload values worth showing inline; nested values are left to
/// the JSON metadata
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn format_suggestions(result: &SuggestionResult) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Suggestions for \"{}\"\n", result.partial_term.trim());

    if result.suggestions.is_empty() {
        md.push_str("_No suggestions._\n");
        return md;
    }

    for (i, name) in result.suggestions.iter().enumerate() {
        let _ = writeln!(md, "{}. {}", i + 1, name);
    }
    md
}
