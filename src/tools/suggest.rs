//! Suggest tool implementation

use super::format::format_suggestions;
use super::{parse_args, respond, with_timeout};
use crate::cli::SuggestArgs;
use crate::error::{validate_limit, validate_term, AppError, SUGGEST_LIMIT_MAX};
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::search::SearchEngine;
use crate::store::RecordStore;
use serde_json::Value;
use tracing::debug;

pub async fn handle_suggest<S: RecordStore>(
    engine: &SearchEngine<S>,
    id: Option<Value>,
    args: Value,
) -> McpResponse {
    let result = with_timeout("Suggest", async {
        let suggest_args: SuggestArgs = parse_args(args)?;
        execute_suggest(engine, suggest_args).await
    })
    .await;
    respond(id, result)
}

pub fn validate_suggest_args(args: &SuggestArgs) -> Result<(), AppError> {
    validate_term(&args.partial_term)?;
    if let Some(limit) = args.limit {
        validate_limit(limit, SUGGEST_LIMIT_MAX)?;
    }
    Ok(())
}

pub async fn execute_suggest<S: RecordStore>(
    engine: &SearchEngine<S>,
    args: SuggestArgs,
) -> Result<ToolResult, AppError> {
    validate_suggest_args(&args)?;
    debug!(partial_term = %args.partial_term, scope = ?args.scope, "suggest request");

    let result = engine
        .suggest(&args.partial_term, args.scope.as_deref(), args.limit)
        .await?;

    let markdown = format_suggestions(&result);
    let metadata =
        serde_json::to_value(&result).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(ToolResult::from_items(vec![ContentItem::markdown(markdown, metadata)]))
}
