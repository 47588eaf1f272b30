// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// csvec - CSV to vector search pipeline
///
/// Extracts rows from a CSV file, embeds selected text columns with a
/// local embedding model, and indexes and queries the vectors in Qdrant.
#[derive(Parser, Debug)]
#[command(name = "csvec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse the configured CSV file and write the metadata sidecar
    Extract {
        /// CSV file to read (overrides DATA_PATH)
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Run the full pipeline: extract, embed and upsert into Qdrant
    Index {
        /// CSV file to read (overrides DATA_PATH)
        #[arg(short, long)]
        data: Option<String>,

        /// Columns to embed, comma-separated (overrides TEXT_COLUMNS)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Drop and recreate the collection before indexing (destroys existing points)
        #[arg(long)]
        recreate: bool,
    },

    /// Similarity search against the indexed collection
    #[command(alias = "s")]
    Search {
        /// Query text, embedded with the configured model
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, visible_alias = "top-k")]
        limit: Option<usize>,

        /// Payload filter as field=value (repeatable, all must match)
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
    },

    /// Show collection status and dataset metadata
    Status,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
