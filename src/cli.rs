//! CLI mode implementation
//!
//! Command-line surface for the patient search tools. The argument structs
//! double as MCP tool input schemas.

use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Patient search CLI
#[derive(Parser)]
#[command(name = "patient-search")]
#[command(about = "Fuzzy patient-name search over document records", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Records file (JSON array, or JSON Lines with a .jsonl extension)
    #[arg(long, global = true, env = "PATIENT_SEARCH_RECORDS")]
    pub records: Option<PathBuf>,

    /// Engine configuration file
    #[arg(long, global = true, env = "PATIENT_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the structured JSON response instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fuzzy search documents by patient name
    Search(SearchArgs),
    /// Autocomplete patient names from a prefix
    Suggest(SuggestArgs),
    /// Documents for one patient, strict matching only
    Patient(PatientArgs),
}

/// Search tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SearchArgs {
    /// Patient name or fragment (case-insensitive)
    #[serde(alias = "search_term")]
    #[schemars(description = "Patient name or fragment (case-insensitive)")]
    pub term: String,

    /// Owner scope; only records of this owner are searched
    #[arg(short = 's', long)]
    #[serde(default, alias = "user_id")]
    #[schemars(description = "Owner scope; only records of this owner are searched")]
    pub scope: Option<String>,

    /// Maximum number of results (default 20, max 100)
    #[arg(short = 'l', long)]
    #[serde(default)]
    #[schemars(description = "Maximum number of results (default 20, max 100)")]
    pub limit: Option<usize>,

    /// Number of results to skip
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Number of results to skip (default 0)")]
    pub skip: Option<usize>,

    /// Minimum similarity score, 0.0 to 1.0 (default 0.3)
    #[arg(short = 'm', long)]
    #[serde(default)]
    #[schemars(description = "Minimum similarity score, 0.0 to 1.0 (default 0.3)")]
    pub min_similarity: Option<f64>,

    /// Include similarity score and match type per document (default true)
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Include similarity score and match type per document (default true)")]
    pub include_score: Option<bool>,
}

/// Suggest tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SuggestArgs {
    /// Beginning of a patient name
    #[serde(alias = "term")]
    #[schemars(description = "Beginning of a patient name")]
    pub partial_term: String,

    /// Owner scope
    #[arg(short = 's', long)]
    #[serde(default, alias = "user_id")]
    #[schemars(description = "Owner scope")]
    pub scope: Option<String>,

    /// Maximum number of suggestions (default 10, max 50)
    #[arg(short = 'l', long)]
    #[serde(default)]
    #[schemars(description = "Maximum number of suggestions (default 10, max 50)")]
    pub limit: Option<usize>,
}

/// Patient documents tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct PatientArgs {
    /// Full patient name
    #[serde(alias = "patient_name")]
    #[schemars(description = "Full patient name")]
    pub name: String,

    /// Owner scope
    #[arg(short = 's', long)]
    #[serde(default, alias = "user_id")]
    #[schemars(description = "Owner scope")]
    pub scope: Option<String>,

    /// Maximum number of documents (default 20, max 100)
    #[arg(short = 'l', long)]
    #[serde(default)]
    #[schemars(description = "Maximum number of documents (default 20, max 100)")]
    pub limit: Option<usize>,

    /// Number of documents to skip
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Number of documents to skip (default 0)")]
    pub skip: Option<usize>,
}
