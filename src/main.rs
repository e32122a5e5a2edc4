//! patient-search MCP Server & CLI
//!
//! Dual-mode application:
//! - MCP Server Mode (no subcommand): Model Context Protocol server using stdio
//! - CLI Mode: Command-line utility for direct tool execution
//!
//! Implements three tools:
//! - `search(term)` - Fuzzy search documents by patient name
//! - `suggest(partial_term)` - Autocomplete patient names
//! - `patient(name)` - Documents for one patient, strict matching

use anyhow::Context;
use clap::Parser;
use patient_search::cli::{Cli, Commands};
use patient_search::config::EngineConfig;
use patient_search::error::AppError;
use patient_search::mcp::{self, ToolResult};
use patient_search::search::SearchEngine;
use patient_search::store::MemoryStore;
use patient_search::tools::{self, with_timeout};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Logs always go to stderr so stdout stays clean for results and JSON-RPC
fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let engine = build_engine(cli.records.as_deref(), cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return run_mcp_mode(&engine).await;
    };

    let result: ToolResult = match command {
        Commands::Search(args) => {
            with_timeout("Search", tools::search::execute_search(&engine, args)).await?
        }
        Commands::Suggest(args) => {
            with_timeout("Suggest", tools::suggest::execute_suggest(&engine, args)).await?
        }
        Commands::Patient(args) => {
            with_timeout("Patient", tools::patient::execute_patient(&engine, args)).await?
        }
    };

    if cli.json {
        let metadata = result.metadata().cloned().unwrap_or_default();
        let pretty = serde_json::to_string_pretty(&metadata)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        println!("{}", pretty);
    } else {
        println!("{}", result.markdown());
    }
    Ok(())
}

fn build_engine(
    records: Option<&Path>,
    config: Option<&Path>,
) -> Result<SearchEngine<MemoryStore>, AppError> {
    let records = records.ok_or_else(|| {
        AppError::Config(
            "No records file given: pass --records or set PATIENT_SEARCH_RECORDS".to_string(),
        )
    })?;

    let config = EngineConfig::load(config)?;
    let store = MemoryStore::from_file(records)?;
    info!(records = store.len(), "record store ready");

    SearchEngine::new(store, &config)
}

/// Run in MCP server mode
async fn run_mcp_mode(engine: &SearchEngine<MemoryStore>) -> Result<(), AppError> {
    info!("Starting patient-search MCP Server");

    mcp::handle_stdio(engine)
        .await
        .context("MCP stdio transport failed")?;

    Ok(())
}
