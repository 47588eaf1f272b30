// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-backed configuration for csvec
//!
//! Every variable the pipeline consumes is declared and validated here.
//! Settings are loaded once at startup and passed by reference to the
//! components; nothing reads the environment after `Settings::from_env`
//! returns.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Vector dimensionality used when VECTOR_SIZE is not set.
pub const DEFAULT_VECTOR_SIZE: u64 = 1536;

/// Texts submitted per embedding batch when EMBED_BATCH_SIZE is not set.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 256;

/// Configuration loading failure. Raised for the first missing or
/// malformed variable; the message names the variable so the fix is
/// obvious from the error alone.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Qdrant endpoint and collection settings.
#[derive(Debug, Clone)]
pub struct QdrantSettings {
    pub host: String,
    pub port: u16,
    pub collection_name: String,
    /// Explicit VECTOR_SIZE override, if any. When set it must agree with
    /// the embedding model's output dimension.
    pub vector_size: Option<u64>,
}

impl QdrantSettings {
    /// URL of the gRPC endpoint.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Target vector dimensionality (defaults to 1536)
    pub fn vector_size(&self) -> u64 {
        self.vector_size.unwrap_or(DEFAULT_VECTOR_SIZE)
    }
}

/// Postgres connection settings. Validated for parity with the deployment
/// environment; no code path in this crate opens a Postgres connection yet.
#[derive(Debug, Clone)]
pub struct PostgresSettings {
    pub user: String,
    pub password: String,
    pub db: String,
    pub host: String,
    pub port: u16,
}

impl PostgresSettings {
    /// Connection URL for downstream consumers.
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.db
        )
    }
}

/// All settings the pipeline consumes, sourced from the environment once
/// at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub qdrant: QdrantSettings,
    pub postgres: PostgresSettings,
    /// CSV file the extractor reads.
    pub data_path: PathBuf,
    /// Directory the dataset metadata sidecar is written to.
    pub metadata_path: PathBuf,
    /// Embedding model name (see embedding::provider for supported names).
    pub embedding_model_name: String,
    /// Columns rendered into embedding text; empty means all columns.
    pub text_columns: Vec<String>,
    /// Texts submitted per embedding batch.
    pub embed_batch_size: usize,
}

impl Settings {
    /// Load settings from the environment, failing on the first missing or
    /// malformed variable. Loading a `.env` file is the caller's concern;
    /// main does it before calling this.
    pub fn from_env() -> Result<Self, ConfigError> {
        let qdrant = QdrantSettings {
            host: require("QDRANT_HOST")?,
            port: require_parsed("QDRANT_PORT")?,
            collection_name: require("COLLECTION_NAME")?,
            vector_size: optional_parsed("VECTOR_SIZE")?,
        };

        let postgres = PostgresSettings {
            user: require("POSTGRES_USER")?,
            password: require("POSTGRES_PASSWORD")?,
            db: require("POSTGRES_DB")?,
            host: require("POSTGRES_HOST")?,
            port: require_parsed("POSTGRES_PORT")?,
        };

        Ok(Self {
            qdrant,
            postgres,
            data_path: PathBuf::from(require("DATA_PATH")?),
            metadata_path: PathBuf::from(require("METADATA_PATH")?),
            embedding_model_name: require("EMBEDDING_MODEL_NAME")?,
            text_columns: optional("TEXT_COLUMNS")
                .map(|raw| split_columns(&raw))
                .unwrap_or_default(),
            embed_batch_size: optional_parsed("EMBED_BATCH_SIZE")?
                .unwrap_or(DEFAULT_EMBED_BATCH_SIZE),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn require_parsed<T>(name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = require(name)?;
    parse_value(name, &raw)
}

fn optional_parsed<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(name) {
        Some(raw) => parse_value(name, &raw).map(Some),
        None => Ok(None),
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidVar {
        name,
        value: raw.trim().to_string(),
        reason: err.to_string(),
    })
}

/// Split a comma-separated column list, dropping empty entries.
fn split_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}
