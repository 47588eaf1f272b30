// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extract command: parse the CSV file and write the metadata sidecar.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::cli::OutputFormat;
use csvec::config::Settings;
use csvec::extract::Extractor;

pub fn run(data_override: Option<&str>, format: OutputFormat) -> Result<()> {
    let settings = Settings::from_env()?;
    let data_path = data_override
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.data_path.clone());
    let extractor = Extractor::new(&data_path, &settings.metadata_path);
    let dataset = extractor.extract()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dataset.metadata())?),
        OutputFormat::Text => {
            println!(
                "{} Extracted {} rows x {} columns from {}",
                "✓".green(),
                dataset.num_rows(),
                dataset.num_columns(),
                data_path.display()
            );
            println!(
                "  Metadata written to {}",
                extractor.metadata_path().display()
            );
        }
    }

    Ok(())
}
