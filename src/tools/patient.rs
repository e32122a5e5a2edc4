//! Patient documents tool implementation
//!
//! Same pipeline as `search`, but with the strict patient threshold so only
//! near-certain matches for one patient come back.

use super::format::format_search_result;
use super::{parse_args, respond, with_timeout};
use crate::cli::PatientArgs;
use crate::error::{validate_limit, validate_term, AppError, SEARCH_LIMIT_MAX};
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::search::SearchEngine;
use crate::store::RecordStore;
use serde_json::Value;
use tracing::debug;

pub async fn handle_patient<S: RecordStore>(
    engine: &SearchEngine<S>,
    id: Option<Value>,
    args: Value,
) -> McpResponse {
    let result = with_timeout("Patient", async {
        let patient_args: PatientArgs = parse_args(args)?;
        execute_patient(engine, patient_args).await
    })
    .await;
    respond(id, result)
}

pub async fn execute_patient<S: RecordStore>(
    engine: &SearchEngine<S>,
    args: PatientArgs,
) -> Result<ToolResult, AppError> {
    validate_term(&args.name)?;
    if let Some(limit) = args.limit {
        validate_limit(limit, SEARCH_LIMIT_MAX)?;
    }
    debug!(name = %args.name, scope = ?args.scope, "patient documents request");

    let result = engine
        .documents_for_patient(
            &args.name,
            args.scope.as_deref(),
            args.limit,
            args.skip.unwrap_or(0),
        )
        .await?;

    let markdown = format_search_result(&result, "Documents for patient");
    let metadata =
        serde_json::to_value(&result).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(ToolResult::from_items(vec![ContentItem::markdown(markdown, metadata)]))
}
