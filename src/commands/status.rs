// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status command: report collection shape and dataset metadata.

use std::fs;

use anyhow::Result;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::connect_store;
use csvec::config::Settings;
use csvec::extract::{DatasetMetadata, Extractor};
use csvec::output::{colorize_name, use_colors};

pub async fn run(format: OutputFormat) -> Result<()> {
    let settings = Settings::from_env()?;
    let store = connect_store(&settings, settings.qdrant.vector_size())?;

    let status = if store.collection_exists().await? {
        Some(store.collection_status().await?)
    } else {
        None
    };

    let extractor = Extractor::new(&settings.data_path, &settings.metadata_path);
    let metadata = read_sidecar(&extractor);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "collection": status,
                "dataset": metadata,
            }))?
        ),
        OutputFormat::Text => {
            let use_color = use_colors();
            match &status {
                Some(status) => println!(
                    "Collection {}: {} points, vector size {}, distance {}",
                    colorize_name(&status.name, use_color),
                    status.points_count,
                    status.vector_size,
                    status.distance
                ),
                None => println!(
                    "Collection {}: does not exist yet (run index first)",
                    colorize_name(&settings.qdrant.collection_name, use_color)
                ),
            }
            match &metadata {
                Some(metadata) => println!(
                    "Dataset: {} rows x {} columns ({})",
                    metadata.num_rows,
                    metadata.num_columns,
                    metadata.columns.join(", ")
                ),
                None => println!("Dataset: no metadata sidecar (run extract first)"),
            }
        }
    }

    Ok(())
}

fn read_sidecar(extractor: &Extractor) -> Option<DatasetMetadata> {
    let raw = fs::read_to_string(extractor.metadata_path()).ok()?;
    serde_json::from_str(&raw).ok()
}
