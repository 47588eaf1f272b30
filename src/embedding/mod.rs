// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns row text into fixed-length vectors
//!
//! Providers are loaded once and reused for the whole run; the fastembed
//! provider is the production path, the dummy provider exists for tests.

pub mod provider;

pub use provider::{
    clean_text, create_provider, DummyProvider, EmbedError, EmbeddingProvider, FastEmbedder,
    DEFAULT_EMBEDDING_DIM,
};
