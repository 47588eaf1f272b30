// SPDX-License-Identifier: MIT OR Apache-2.0

//! csvec - CSV to vector search pipeline
//!
//! Extracts tabular data from CSV files, embeds selected text columns
//! with a local embedding model, and indexes and queries the vectors in
//! a Qdrant collection.

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with CSVEC_LOG env var (e.g., CSVEC_LOG=debug csvec index)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CSVEC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Pick up a .env file from the working directory, if there is one.
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    match cli.command {
        Commands::Extract { data } => commands::extract::run(data.as_deref(), format)?,
        Commands::Index {
            data,
            columns,
            recreate,
        } => commands::index::run(data.as_deref(), &columns, recreate, format).await?,
        Commands::Search {
            query,
            limit,
            filters,
        } => commands::search::run(&query, limit, &filters, format).await?,
        Commands::Status => commands::status::run(format).await?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "csvec", &mut std::io::stdout());
        }
    }

    Ok(())
}
