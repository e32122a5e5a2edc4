//! Search tool implementation
//!
//! Implements the `search(term, scope?, limit?, skip?, min_similarity?,
//! include_score?)` MCP tool

use super::format::format_search_result;
use super::{parse_args, respond, with_timeout};
use crate::cli::SearchArgs;
use crate::error::{validate_limit, validate_similarity, validate_term, AppError, SEARCH_LIMIT_MAX};
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::search::{SearchEngine, SearchQuery};
use crate::store::RecordStore;
use serde_json::Value;
use tracing::debug;

pub async fn handle_search<S: RecordStore>(
    engine: &SearchEngine<S>,
    id: Option<Value>,
    args: Value,
) -> McpResponse {
    let result = with_timeout("Search", async {
        let search_args: SearchArgs = parse_args(args)?;
        execute_search(engine, search_args).await
    })
    .await;
    respond(id, result)
}

pub fn validate_search_args(args: &SearchArgs) -> Result<(), AppError> {
    validate_term(&args.term)?;
    if let Some(limit) = args.limit {
        validate_limit(limit, SEARCH_LIMIT_MAX)?;
    }
    if let Some(min_similarity) = args.min_similarity {
        validate_similarity(min_similarity, "min_similarity")?;
    }
    Ok(())
}

/// Shared implementation for search (used by MCP and CLI)
pub async fn execute_search<S: RecordStore>(
    engine: &SearchEngine<S>,
    args: SearchArgs,
) -> Result<ToolResult, AppError> {
    validate_search_args(&args)?;
    debug!(term = %args.term, scope = ?args.scope, "search request");

    let query = SearchQuery {
        term: args.term,
        scope: args.scope,
        limit: args.limit,
        skip: args.skip.unwrap_or(0),
        min_similarity: args.min_similarity,
        include_score: args.include_score.unwrap_or(true),
    };
    let result = engine.search(&query).await?;

    let markdown = format_search_result(&result, "Patient search");
    let metadata =
        serde_json::to_value(&result).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(ToolResult::from_items(vec![ContentItem::markdown(markdown, metadata)]))
}
