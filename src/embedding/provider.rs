// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! The fastembed-based provider loads its model once at construction, so a
//! bad model name or a failed download surfaces before any data is touched.

use std::borrow::Cow;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;
use tracing::{debug, error, info};

/// Output dimension of the dummy provider when none is requested.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

const MAX_BATCH_SIZE: usize = 1024;

/// Embedding failure, split by stage so callers can tell a bad model name
/// from a runtime inference problem.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(
        "unsupported embedding model '{0}'; supported: minilm, bge-small, bge-base, nomic, dummy"
    )]
    UnsupportedModel(String),
    #[error("failed to load embedding model '{model}'")]
    ModelLoad {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("embedding inference failed")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("embedding backend returned {got} vectors for {expected} texts")]
    OutputMismatch { expected: usize, got: usize },
}

/// Trait for embedding providers.
pub trait EmbeddingProvider: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the fixed dimensionality of produced vectors.
    fn dimension(&self) -> usize;

    /// Returns the batch size used by the provider.
    fn batch_size(&self) -> usize;

    /// Generates embeddings for the given texts, one vector per text in
    /// input order. When `clean` is true, whitespace runs are collapsed
    /// before embedding.
    fn embed_texts(&mut self, texts: &[String], clean: bool) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Generates an embedding for a single text.
    fn embed_one(&mut self, text: &str, clean: bool) -> Result<Vec<f32>, EmbedError> {
        let mut result = self.embed_texts(&[text.to_string()], clean)?;
        result.pop().ok_or(EmbedError::OutputMismatch {
            expected: 1,
            got: 0,
        })
    }
}

/// Build a provider from a configured model name. The "dummy" model (or
/// "dummy:<dim>") produces zero vectors without loading anything and is
/// meant for tests and plumbing checks; every other name goes through
/// fastembed.
pub fn create_provider(
    model_name: &str,
    batch_size: usize,
) -> Result<Box<dyn EmbeddingProvider>, EmbedError> {
    let name = model_name.trim();
    if let Some(rest) = name.strip_prefix("dummy") {
        let dimension = match rest.strip_prefix(':') {
            Some(dim) => dim
                .parse()
                .map_err(|_| EmbedError::UnsupportedModel(name.to_string()))?,
            None if rest.is_empty() => DEFAULT_EMBEDDING_DIM,
            None => return Err(EmbedError::UnsupportedModel(name.to_string())),
        };
        return Ok(Box::new(DummyProvider::new(dimension, batch_size)));
    }
    Ok(Box::new(FastEmbedder::new(name, batch_size)?))
}

/// Map a configured model name to a fastembed model and its output
/// dimension. Accepts the short alias and the upstream repository id.
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbedError> {
    match name.trim().to_lowercase().as_str() {
        "minilm" | "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "bge-small" | "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => {
            Ok((EmbeddingModel::BGESmallENV15, 384))
        }
        "bge-base" | "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => {
            Ok((EmbeddingModel::BGEBaseENV15, 768))
        }
        "nomic" | "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            Ok((EmbeddingModel::NomicEmbedTextV15, 768))
        }
        other => Err(EmbedError::UnsupportedModel(other.to_string())),
    }
}

/// Collapse whitespace runs into single spaces and trim both ends.
/// Borrows when the input is already in that form.
pub fn clean_text(text: &str) -> Cow<'_, str> {
    if needs_cleaning(text) {
        Cow::Owned(text.split_whitespace().collect::<Vec<_>>().join(" "))
    } else {
        Cow::Borrowed(text)
    }
}

fn needs_cleaning(text: &str) -> bool {
    let mut prev_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if prev_space || ch != ' ' {
                return true;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
    }
    // a trailing space is the only way to end with prev_space still set
    prev_space && !text.is_empty()
}

fn prepare_texts<'a>(texts: &'a [String], clean: bool) -> Vec<Cow<'a, str>> {
    texts
        .iter()
        .map(|text| {
            if clean {
                clean_text(text)
            } else {
                Cow::Borrowed(text.as_str())
            }
        })
        .collect()
}

/// FastEmbed provider. Loads the model eagerly in `new`.
pub struct FastEmbedder {
    embedder: TextEmbedding,
    model_id: String,
    dimension: usize,
    batch_size: usize,
}

impl FastEmbedder {
    pub fn new(model_name: &str, batch_size: usize) -> Result<Self, EmbedError> {
        let (model, dimension) = resolve_model(model_name)?;
        let model_id = model_name.trim().to_string();
        let embedder = TextEmbedding::try_new(InitOptions::new(model)).map_err(|source| {
            error!(model = %model_id, %source, "failed to load embedding model");
            EmbedError::ModelLoad {
                model: model_id.clone(),
                source: source.into(),
            }
        })?;
        info!(model = %model_id, dimension, "embedding model loaded");

        Ok(Self {
            embedder,
            model_id,
            dimension,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        })
    }
}

impl EmbeddingProvider for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String], clean: bool) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = prepare_texts(texts, clean);
        let embeddings = self
            .embedder
            .embed(&prepared, Some(self.batch_size))
            .map_err(|source| {
                error!(model = %self.model_id, texts = texts.len(), %source, "embedding inference failed");
                EmbedError::Inference(source.into())
            })?;

        if embeddings.len() != texts.len() {
            return Err(EmbedError::OutputMismatch {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }
        debug!(model = %self.model_id, texts = texts.len(), "generated embeddings");

        Ok(embeddings)
    }
}

/// Dummy provider that returns zero vectors (for tests and plumbing checks).
pub struct DummyProvider {
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl DummyProvider {
    pub fn new(dimension: usize, batch_size: usize) -> Self {
        Self {
            model: "dummy".to_string(),
            dimension,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }
}

impl EmbeddingProvider for DummyProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String], _clean: bool) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
