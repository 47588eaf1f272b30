// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index command: run the extract, embed, upsert pipeline.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::commands::{connect_store, resolved_vector_size};
use csvec::config::Settings;
use csvec::embedding::create_provider;
use csvec::extract::Extractor;
use csvec::pipeline;

pub async fn run(
    data_override: Option<&str>,
    columns_override: &[String],
    recreate: bool,
    format: OutputFormat,
) -> Result<()> {
    let settings = Settings::from_env()?;
    let data_path = data_override
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.data_path.clone());
    let extractor = Extractor::new(&data_path, &settings.metadata_path);

    let columns = if columns_override.is_empty() {
        settings.text_columns.clone()
    } else {
        columns_override.to_vec()
    };

    let mut provider = create_provider(&settings.embedding_model_name, settings.embed_batch_size)?;
    let vector_size = resolved_vector_size(&settings, provider.as_ref())?;
    let store = connect_store(&settings, vector_size)?;

    let stats = pipeline::run(&extractor, &columns, provider.as_mut(), &store, recreate).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            println!(
                "{} Indexed {} rows into '{}' ({} vectors upserted)",
                "✓".green(),
                stats.rows,
                store.collection_name(),
                stats.upserted
            );
        }
    }

    Ok(())
}
