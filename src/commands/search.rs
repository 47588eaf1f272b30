// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search command: embed the query and run a similarity search.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::{connect_store, resolved_vector_size};
use csvec::config::Settings;
use csvec::embedding::create_provider;
use csvec::output::{colorize_field, colorize_id, colorize_score, use_colors};
use csvec::store::{keyword_filter, SearchHit, DEFAULT_TOP_K};

pub async fn run(
    query: &str,
    limit: Option<usize>,
    filters: &[String],
    format: OutputFormat,
) -> Result<()> {
    let settings = Settings::from_env()?;
    let filter = parse_filters(filters)?;

    let mut provider = create_provider(&settings.embedding_model_name, settings.embed_batch_size)?;
    let query_vector = provider.embed_one(query, true)?;

    let vector_size = resolved_vector_size(&settings, provider.as_ref())?;
    let store = connect_store(&settings, vector_size)?;
    store.ensure_collection().await?;

    let hits = store
        .search_vectors(query_vector, limit.unwrap_or(DEFAULT_TOP_K), filter)
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
        OutputFormat::Text => print_hits(&hits),
    }

    Ok(())
}

fn parse_filters(specs: &[String]) -> Result<Option<qdrant_client::qdrant::Filter>> {
    let mut pairs = Vec::with_capacity(specs.len());
    for spec in specs {
        match spec.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                pairs.push((field.trim(), value.trim()));
            }
            _ => bail!("invalid filter '{spec}', expected FIELD=VALUE"),
        }
    }
    Ok(keyword_filter(pairs))
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results");
        return;
    }

    let use_color = use_colors();
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. {}  score {}",
            rank + 1,
            colorize_id(&hit.id, use_color),
            colorize_score(hit.score, use_color)
        );
        for (field, value) in &hit.payload {
            println!(
                "   {}: {}",
                colorize_field(field, use_color),
                render_value(value)
            );
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
