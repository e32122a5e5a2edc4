//! Error types and input validation for the patient search server

use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Longest search term accepted before normalization
pub const MAX_TERM_CHARS: usize = 200;

pub const SEARCH_LIMIT_MAX: usize = 100;
pub const SUGGEST_LIMIT_MAX: usize = 50;

/// Application error types surfaced to CLI and MCP callers
#[derive(Debug, Error, Serialize)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Record retrieval unavailable: {0}")]
    RetrievalUnavailable(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for MCP responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::RetrievalUnavailable(_) => "retrieval_unavailable",
            AppError::Config(_) => "config_error",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Process exit code used in CLI mode
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidInput(_) => 1,
            AppError::RetrievalUnavailable(_) => 2,
            AppError::Config(_) => 3,
            AppError::Timeout(_) => 4,
            AppError::Internal(_) => 5,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Load { .. } => AppError::Config(err.to_string()),
            _ => AppError::RetrievalUnavailable(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Reject terms the engine should never see: blank or oversized
pub fn validate_term(term: &str) -> Result<(), AppError> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Search term cannot be empty".to_string()));
    }

    if trimmed.chars().count() > MAX_TERM_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Search term too long, maximum {} characters",
            MAX_TERM_CHARS
        )));
    }

    Ok(())
}

pub fn validate_limit(limit: usize, max: usize) -> Result<(), AppError> {
    if limit == 0 || limit > max {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}, got {}",
            max, limit
        )));
    }
    Ok(())
}

pub fn validate_similarity(value: f64, field: &str) -> Result<(), AppError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::InvalidInput(format!(
            "{} must be between 0.0 and 1.0, got {}",
            field, value
        )));
    }
    Ok(())
}
