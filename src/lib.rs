//! Fuzzy patient-name search over document records.
//!
//! The [`search::SearchEngine`] owns the whole pipeline and reads records
//! through the [`store::RecordStore`] trait. [`tools`] and [`mcp`] expose
//! it as CLI commands and MCP tools.

pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod search;
pub mod store;
pub mod tools;
