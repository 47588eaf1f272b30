// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations for the csvec CLI.

pub mod extract;
pub mod index;
pub mod search;
pub mod status;

use anyhow::Result;

use csvec::config::Settings;
use csvec::embedding::EmbeddingProvider;
use csvec::store::VectorStore;

/// Resolve the collection vector size for a run with a live provider. An
/// explicit VECTOR_SIZE must agree with the model's output dimension;
/// when unset, the model decides.
pub fn resolved_vector_size(settings: &Settings, provider: &dyn EmbeddingProvider) -> Result<u64> {
    let model_dim = provider.dimension() as u64;
    match settings.qdrant.vector_size {
        Some(size) if size != model_dim => anyhow::bail!(
            "VECTOR_SIZE={} does not match the {}-dimensional output of model '{}'",
            size,
            model_dim,
            provider.model_id()
        ),
        _ => Ok(model_dim),
    }
}

/// Open the vector store for the configured endpoint and collection.
pub fn connect_store(settings: &Settings, vector_size: u64) -> Result<VectorStore> {
    Ok(VectorStore::connect(
        settings.qdrant.url(),
        &settings.qdrant.collection_name,
        vector_size,
    )?)
}
