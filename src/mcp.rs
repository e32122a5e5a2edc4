//! MCP (Model Context Protocol) handling module
//!
//! This module implements the JSON-RPC 2.0 protocol for MCP communication.

use crate::search::SearchEngine;
use crate::store::RecordStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tracing::{debug, error, info};

/// MCP JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    /// JSON-RPC version field, always "2.0" and never read
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// Initialize request parameters
#[derive(Debug, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// MCP JSON-RPC 2.0 response structure
#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP Error structure
#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: String,
    pub message: String,
}

/// MCP Tool call arguments
#[derive(Debug, Deserialize)]
pub struct ToolCallArgs {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// MCP Content item
#[derive(Debug, Serialize)]
pub struct ContentItem {
    pub r#type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// MCP Tool result
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
}

impl McpResponse {
    /// Create a successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: &str, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

impl ToolResult {
    pub fn from_items(content: Vec<ContentItem>) -> Self {
        Self { content }
    }

    /// Markdown of the first content item
    pub fn markdown(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or_default()
    }

    /// Structured response carried by the first content item
    pub fn metadata(&self) -> Option<&Value> {
        self.content.first().and_then(|c| c.metadata.as_ref())
    }
}

impl ContentItem {
    /// Markdown text with the structured response attached
    pub fn markdown(text: impl Into<String>, metadata: Value) -> Self {
        Self {
            r#type: "text".to_string(),
            text: text.into(),
            metadata: Some(metadata),
        }
    }
}

/// Parse MCP request from JSON string
pub fn parse_request(json: &str) -> Result<McpRequest> {
    let request: McpRequest = serde_json::from_str(json)?;
    Ok(request)
}

/// Serialize MCP response to JSON string
pub fn serialize_response(response: &McpResponse) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}

/// Handle stdio MCP communication
pub async fn handle_stdio<S: RecordStore>(engine: &SearchEngine<S>) -> Result<()> {
    info!("Starting patient-search MCP server on stdio");

    let stdin = tokio::io::stdin();
    let mut reader = AsyncBufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received request: {}", line);

        let response = match parse_request(&line) {
            Ok(request) => handle_request(engine, request).await,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                McpResponse::error(None, "parse_error", &format!("Invalid JSON: {}", e))
            }
        };

        let response_json = serialize_response(&response)?;
        debug!("Sending response: {}", response_json);

        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, MCP server exiting");
    Ok(())
}

/// Handle a single MCP request
pub async fn handle_request<S: RecordStore>(
    engine: &SearchEngine<S>,
    request: McpRequest,
) -> McpResponse {
    match request.method.as_str() {
        "initialize" => handle_initialize(request),
        "tools/call" => handle_tool_call(engine, request).await,
        "tools/list" => handle_tools_list(request),
        _ => McpResponse::error(
            request.id,
            "method_not_found",
            &format!("Method '{}' not found", request.method),
        ),
    }
}

/// Handle tools/call method
async fn handle_tool_call<S: RecordStore>(
    engine: &SearchEngine<S>,
    request: McpRequest,
) -> McpResponse {
    let args: ToolCallArgs = match serde_json::from_value(request.params.unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            return McpResponse::error(
                request.id.clone(),
                "invalid_params",
                &format!("Invalid parameters: {}", e),
            )
        }
    };

    match args.name.as_str() {
        "search" => crate::tools::search::handle_search(engine, request.id, args.arguments).await,
        "suggest" => {
            crate::tools::suggest::handle_suggest(engine, request.id, args.arguments).await
        }
        "patient" => {
            crate::tools::patient::handle_patient(engine, request.id, args.arguments).await
        }
        _ => McpResponse::error(
            request.id,
            "tool_not_found",
            &format!("Tool '{}' not found", args.name),
        ),
    }
}

/// Handle tools/list method
fn handle_tools_list(request: McpRequest) -> McpResponse {
    let tools = build_tools_array();

    McpResponse::success(request.id, serde_json::json!({ "tools": tools }))
}

/// Handle initialize method
fn handle_initialize(request: McpRequest) -> McpResponse {
    let client = request
        .params
        .and_then(|params| serde_json::from_value::<InitializeParams>(params).ok())
        .and_then(|p| p.client_info);
    if let Some(client) = client {
        info!(
            client = client.name.as_deref().unwrap_or("unknown"),
            version = client.version.as_deref().unwrap_or("unknown"),
            "MCP client connected"
        );
    }

    let tools = build_tools_array();
    let result = serde_json::json!({
        "serverInfo": {
            "name": "patient-search",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "list": true, "call": true }
        },
        "tools": tools
    });
    McpResponse::success(request.id, result)
}

/// Build the tools array returned from tools/list and initialize
fn build_tools_array() -> serde_json::Value {
    use crate::cli::{PatientArgs, SearchArgs, SuggestArgs};
    use schemars::schema_for;

    // Generate JSON schemas from the CLI argument structs
    let search_schema = schema_for!(SearchArgs);
    let suggest_schema = schema_for!(SuggestArgs);
    let patient_schema = schema_for!(PatientArgs);

    serde_json::json!([
        {
            "name": "search",
            "description": "Fuzzy search documents by patient name, ranked by similarity",
            "inputSchema": search_schema
        },
        {
            "name": "suggest",
            "description": "Autocomplete patient names starting with a partial term",
            "inputSchema": suggest_schema
        },
        {
            "name": "patient",
            "description": "Documents belonging to one patient, strict matching only",
            "inputSchema": patient_schema
        }
    ])
}
