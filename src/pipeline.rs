// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline orchestration: extract, embed, upsert
//!
//! Rows are rendered to "column: value" text, embedded in batches, and
//! upserted with the row index as the point id, so re-running the pipeline
//! over the same file updates points in place instead of duplicating them.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::embedding::{EmbedError, EmbeddingProvider};
use crate::extract::{ExtractError, Extractor, TabularDataset};
use crate::store::{StoreError, VectorRecord, VectorStore};

const UPSERT_BATCH_SIZE: usize = 256;

/// Pipeline failure: either a stage error passed through, or a problem
/// with the requested column selection or vector shape.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("column '{0}' not found in the dataset")]
    UnknownColumn(String),
    #[error(
        "model '{model}' produces {model_dim}-dimensional vectors but collection '{collection}' \
         expects {collection_dim}; set VECTOR_SIZE to match the model or recreate the collection"
    )]
    DimensionMismatch {
        model: String,
        model_dim: usize,
        collection: String,
        collection_dim: u64,
    },
}

/// Counts reported by a pipeline run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IndexStats {
    pub rows: usize,
    pub embedded: usize,
    pub upserted: usize,
}

/// Run the whole pipeline: parse the CSV, ensure (or recreate) the
/// collection, embed every row and upsert the vectors. A dimension
/// mismatch or an unknown column selection is refused before the sidecar
/// is written or the collection is touched.
pub async fn run(
    extractor: &Extractor,
    columns: &[String],
    provider: &mut dyn EmbeddingProvider,
    store: &VectorStore,
    recreate: bool,
) -> Result<IndexStats, PipelineError> {
    check_dimensions(provider, store)?;
    let dataset = extractor.read()?;
    resolve_columns(&dataset, columns)?;
    extractor.store_metadata(&dataset.metadata())?;
    if recreate {
        store.recreate_collection().await?;
    } else {
        store.ensure_collection().await?;
    }
    index_dataset(&dataset, columns, provider, store).await
}

/// Embed every row of an already extracted dataset and upsert the vectors.
pub async fn index_dataset(
    dataset: &TabularDataset,
    columns: &[String],
    provider: &mut dyn EmbeddingProvider,
    store: &VectorStore,
) -> Result<IndexStats, PipelineError> {
    check_dimensions(provider, store)?;

    let records = embed_rows(dataset, columns, provider)?;
    let embedded = records.len();

    let mut upserted = 0;
    let mut remaining = records;
    while !remaining.is_empty() {
        let split = remaining.len().min(UPSERT_BATCH_SIZE);
        let tail = remaining.split_off(split);
        upserted += store.upsert_points(remaining).await?;
        remaining = tail;
    }

    let stats = IndexStats {
        rows: dataset.num_rows(),
        embedded,
        upserted,
    };
    info!(
        collection = %store.collection_name(),
        rows = stats.rows,
        upserted = stats.upserted,
        "dataset indexed"
    );
    Ok(stats)
}

/// Embed every row into a vector record carrying the full row as payload.
/// Texts are submitted in provider-sized batches; record ids are row
/// indices in file order.
pub fn embed_rows(
    dataset: &TabularDataset,
    columns: &[String],
    provider: &mut dyn EmbeddingProvider,
) -> Result<Vec<VectorRecord>, PipelineError> {
    let texts = row_texts(dataset, columns)?;
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} rows | Embedding with {msg}")
            .expect("valid progress bar template")
            .progress_chars("##."),
    );
    pb.set_message(provider.model_id().to_string());

    let batch_size = provider.batch_size().max(1);
    let mut records = Vec::with_capacity(texts.len());
    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = provider.embed_texts(batch, true)?;
        if vectors.len() != batch.len() {
            return Err(EmbedError::OutputMismatch {
                expected: batch.len(),
                got: vectors.len(),
            }
            .into());
        }
        let base = batch_index * batch_size;
        for (offset, vector) in vectors.into_iter().enumerate() {
            let row = base + offset;
            records.push(VectorRecord {
                id: row as u64,
                vector,
                payload: row_payload(dataset, row),
            });
        }
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    Ok(records)
}

/// Render each row into one embedding text. An empty column selection
/// means all columns, in file order.
pub fn row_texts(
    dataset: &TabularDataset,
    columns: &[String],
) -> Result<Vec<String>, PipelineError> {
    let indices = resolve_columns(dataset, columns)?;
    Ok(dataset
        .rows()
        .iter()
        .map(|row| render_row(dataset, row, &indices))
        .collect())
}

fn check_dimensions(
    provider: &dyn EmbeddingProvider,
    store: &VectorStore,
) -> Result<(), PipelineError> {
    if provider.dimension() as u64 != store.vector_size() {
        return Err(PipelineError::DimensionMismatch {
            model: provider.model_id().to_string(),
            model_dim: provider.dimension(),
            collection: store.collection_name().to_string(),
            collection_dim: store.vector_size(),
        });
    }
    Ok(())
}

fn resolve_columns(
    dataset: &TabularDataset,
    selected: &[String],
) -> Result<Vec<usize>, PipelineError> {
    if selected.is_empty() {
        return Ok((0..dataset.num_columns()).collect());
    }
    selected
        .iter()
        .map(|name| {
            dataset
                .column_index(name)
                .ok_or_else(|| PipelineError::UnknownColumn(name.clone()))
        })
        .collect()
}

fn render_row(dataset: &TabularDataset, row: &[String], column_indices: &[usize]) -> String {
    column_indices
        .iter()
        .map(|&index| {
            let value = row.get(index).map(String::as_str).unwrap_or("");
            format!("{}: {}", dataset.columns()[index], value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn row_payload(
    dataset: &TabularDataset,
    row: usize,
) -> serde_json::Map<String, serde_json::Value> {
    let mut payload = serde_json::Map::with_capacity(dataset.num_columns());
    if let Some(values) = dataset.rows().get(row) {
        for (column, value) in dataset.columns().iter().zip(values) {
            payload.insert(column.clone(), serde_json::Value::String(value.clone()));
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::clean_text;

    fn dataset() -> TabularDataset {
        TabularDataset::from_parts(
            vec!["title".to_string(), "body".to_string()],
            vec![
                vec!["first".to_string(), "hello  world".to_string()],
                vec!["second".to_string(), "more text".to_string()],
                vec!["third".to_string(), "again".to_string()],
                vec!["fourth".to_string(), "and again".to_string()],
                vec!["fifth".to_string(), "last".to_string()],
            ],
        )
    }

    /// Deterministic provider: vector[0] is the global text sequence
    /// number, vector[1] the prepared text length.
    struct SeqProvider {
        batch: usize,
        served: usize,
        batch_sizes: Vec<usize>,
    }

    impl SeqProvider {
        fn new(batch: usize) -> Self {
            Self {
                batch,
                served: 0,
                batch_sizes: Vec::new(),
            }
        }
    }

    impl EmbeddingProvider for SeqProvider {
        fn model_id(&self) -> &str {
            "seq"
        }

        fn dimension(&self) -> usize {
            2
        }

        fn batch_size(&self) -> usize {
            self.batch
        }

        fn embed_texts(
            &mut self,
            texts: &[String],
            clean: bool,
        ) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.batch_sizes.push(texts.len());
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                let prepared = if clean {
                    clean_text(text).into_owned()
                } else {
                    text.clone()
                };
                out.push(vec![self.served as f32, prepared.len() as f32]);
                self.served += 1;
            }
            Ok(out)
        }
    }

    #[test]
    fn test_row_texts_renders_all_columns_by_default() {
        let texts = row_texts(&dataset(), &[]).unwrap();
        assert_eq!(texts.len(), 5);
        assert_eq!(texts[0], "title: first\nbody: hello  world");
        assert_eq!(texts[1], "title: second\nbody: more text");
    }

    #[test]
    fn test_row_texts_respects_column_selection_order() {
        let texts = row_texts(&dataset(), &["body".to_string(), "title".to_string()]).unwrap();
        assert_eq!(texts[0], "body: hello  world\ntitle: first");

        let texts = row_texts(&dataset(), &["body".to_string()]).unwrap();
        assert_eq!(texts[2], "body: again");
    }

    #[test]
    fn test_row_texts_unknown_column() {
        let err = row_texts(&dataset(), &["missing".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownColumn(name) if name == "missing"));
    }

    #[test]
    fn test_embed_rows_orders_ids_and_batches() {
        let data = dataset();
        let mut provider = SeqProvider::new(2);
        let records = embed_rows(&data, &[], &mut provider).unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(provider.batch_sizes, vec![2, 2, 1]);
        for (row, record) in records.iter().enumerate() {
            assert_eq!(record.id, row as u64);
            // vector[0] carries the sequence number, proving input order
            assert_eq!(record.vector[0], row as f32);
        }
    }

    #[test]
    fn test_embed_rows_cleans_text_before_embedding() {
        let data = dataset();
        let mut provider = SeqProvider::new(10);
        let records = embed_rows(&data, &["body".to_string()], &mut provider).unwrap();

        // "body: hello  world" collapses to "body: hello world"
        assert_eq!(records[0].vector[1], "body: hello world".len() as f32);
    }

    #[test]
    fn test_embed_rows_payload_carries_full_row() {
        let data = dataset();
        let mut provider = SeqProvider::new(3);
        let records = embed_rows(&data, &["title".to_string()], &mut provider).unwrap();

        let payload = &records[1].payload;
        assert_eq!(payload.get("title"), Some(&serde_json::json!("second")));
        assert_eq!(payload.get("body"), Some(&serde_json::json!("more text")));
    }

    #[test]
    fn test_embed_rows_empty_dataset() {
        let data = TabularDataset::from_parts(vec!["only".to_string()], Vec::new());
        let mut provider = SeqProvider::new(4);
        let records = embed_rows(&data, &[], &mut provider).unwrap();
        assert!(records.is_empty());
        assert!(provider.batch_sizes.is_empty());
    }
}
