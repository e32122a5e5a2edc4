//! MCP tools implementation
//!
//! Each tool has an `execute_*` function shared by CLI and MCP modes and a
//! `handle_*` wrapper that turns the outcome into a JSON-RPC response.

pub mod format;
pub mod patient;
pub mod search;
pub mod suggest;

use crate::error::AppError;
use crate::mcp::{McpResponse, ToolResult};
use serde_json::Value;
use std::future::Future;
use tokio::time::{timeout, Duration};

/// Upper bound on any single tool call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Run a tool future under [`REQUEST_TIMEOUT`]
pub async fn with_timeout<T, F>(tool: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match timeout(REQUEST_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} request exceeded {} second timeout",
            tool,
            REQUEST_TIMEOUT.as_secs()
        ))),
    }
}

/// Convert a tool outcome into an MCP response
pub(crate) fn respond(id: Option<Value>, result: Result<ToolResult, AppError>) -> McpResponse {
    match result.and_then(|content| {
        serde_json::to_value(content).map_err(|e| AppError::Internal(e.to_string()))
    }) {
        Ok(value) => McpResponse::success(id, value),
        Err(e) => McpResponse::error(id, e.error_code(), &e.message()),
    }
}

/// Parse tool arguments, reporting failures as invalid input
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, AppError> {
    serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("Invalid arguments: {}", e)))
}
