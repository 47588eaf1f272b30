// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV extraction and dataset metadata
//!
//! Reads the configured CSV file fully into memory and records a JSON
//! sidecar describing its shape. The sidecar is written only after a
//! successful parse, so a failed extraction never leaves a fresh one
//! behind.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// File name of the metadata sidecar inside the metadata directory.
pub const METADATA_FILE: &str = "data_info.json";

/// Extraction failure. Read errors cover both I/O (missing file,
/// permissions) and malformed CSV such as rows with the wrong number of
/// fields.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read csv data from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write dataset metadata to {path}")]
    WriteMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode dataset metadata")]
    EncodeMetadata(#[from] serde_json::Error),
}

/// An in-memory CSV dataset: one ordered column list shared by all rows.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularDataset {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Value at (row, column name), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Snapshot of the dataset shape.
    pub fn metadata(&self) -> DatasetMetadata {
        DatasetMetadata {
            num_rows: self.num_rows(),
            num_columns: self.num_columns(),
            columns: self.columns.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }
}

/// Shape snapshot persisted as the `data_info.json` sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub num_rows: usize,
    pub num_columns: usize,
    pub columns: Vec<String>,
}

/// Reads a CSV file into memory and records its metadata sidecar.
#[derive(Debug, Clone)]
pub struct Extractor {
    data_path: PathBuf,
    metadata_dir: PathBuf,
}

impl Extractor {
    pub fn new(data_path: impl Into<PathBuf>, metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            metadata_dir: metadata_dir.into(),
        }
    }

    /// Path the metadata sidecar is written to.
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_dir.join(METADATA_FILE)
    }

    /// Parse the CSV file into memory, then write the metadata sidecar.
    /// An existing sidecar is overwritten.
    pub fn extract(&self) -> Result<TabularDataset, ExtractError> {
        let dataset = self.read()?;
        self.store_metadata(&dataset.metadata())?;
        Ok(dataset)
    }

    /// Parse the CSV file into memory without touching the sidecar, for
    /// callers that validate the dataset before recording it.
    pub fn read(&self) -> Result<TabularDataset, ExtractError> {
        let dataset = self.read_csv().map_err(|source| {
            error!(path = %self.data_path.display(), %source, "csv extraction failed");
            ExtractError::Read {
                path: self.data_path.clone(),
                source,
            }
        })?;
        info!(
            path = %self.data_path.display(),
            rows = dataset.num_rows(),
            columns = dataset.num_columns(),
            "extracted csv data"
        );
        Ok(dataset)
    }

    fn read_csv(&self) -> Result<TabularDataset, csv::Error> {
        let mut reader = csv::Reader::from_path(&self.data_path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(TabularDataset { columns, rows })
    }

    /// Write the metadata sidecar for an already parsed dataset, creating
    /// the metadata directory if needed.
    pub fn store_metadata(&self, metadata: &DatasetMetadata) -> Result<(), ExtractError> {
        let path = self.metadata_path();
        let json = to_indented_json(metadata)?;
        fs::create_dir_all(&self.metadata_dir).map_err(|source| ExtractError::WriteMetadata {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| {
            error!(path = %path.display(), %source, "failed to store dataset metadata");
            ExtractError::WriteMetadata {
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), "dataset metadata stored");
        Ok(())
    }
}

/// Serialize with 4-space indentation, the sidecar format downstream
/// tools expect.
fn to_indented_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf).expect("serde_json writes utf-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_extract_reads_rows_and_columns() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(&dir, "data.csv", "title,body\nfirst,hello\nsecond,world\n");
        let extractor = Extractor::new(&csv_path, dir.path());

        let dataset = extractor.extract().unwrap();
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(dataset.num_columns(), 2);
        assert_eq!(dataset.columns(), &["title".to_string(), "body".to_string()]);
        assert_eq!(dataset.value(0, "body"), Some("hello"));
        assert_eq!(dataset.value(1, "title"), Some("second"));
        assert_eq!(dataset.value(2, "title"), None);
        assert_eq!(dataset.value(0, "missing"), None);
    }

    #[test]
    fn test_sidecar_matches_dataset_shape() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(&dir, "data.csv", "a,b,c\n1,2,3\n");
        let extractor = Extractor::new(&csv_path, dir.path());

        let dataset = extractor.extract().unwrap();
        let raw = fs::read_to_string(extractor.metadata_path()).unwrap();
        let parsed: DatasetMetadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, dataset.metadata());
        assert_eq!(parsed.num_rows, 1);
        assert_eq!(parsed.num_columns, 3);

        // 4-space indentation, one key per line
        assert!(raw.contains("    \"num_rows\": 1"));
        assert!(raw.contains("    \"columns\": ["));
    }

    #[test]
    fn test_extract_overwrites_stale_sidecar() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(&dir, "data.csv", "x\n1\n2\n3\n");
        let extractor = Extractor::new(&csv_path, dir.path());
        fs::write(extractor.metadata_path(), "{\"stale\": true}").unwrap();

        extractor.extract().unwrap();
        let parsed: DatasetMetadata =
            serde_json::from_str(&fs::read_to_string(extractor.metadata_path()).unwrap()).unwrap();
        assert_eq!(parsed.num_rows, 3);
    }

    #[test]
    fn test_read_does_not_write_the_sidecar() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(&dir, "data.csv", "a,b\n1,2\n");
        let extractor = Extractor::new(&csv_path, dir.path());

        let dataset = extractor.read().unwrap();
        assert_eq!(dataset.num_rows(), 1);
        assert!(!extractor.metadata_path().exists());
    }

    #[test]
    fn test_missing_file_leaves_no_sidecar() {
        let dir = TempDir::new().unwrap();
        let extractor = Extractor::new(dir.path().join("absent.csv"), dir.path());

        let err = extractor.extract().unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
        assert!(!extractor.metadata_path().exists());
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(&dir, "data.csv", "a,b\n1,2\n3\n");
        let extractor = Extractor::new(&csv_path, dir.path());

        let err = extractor.extract().unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
        assert!(!extractor.metadata_path().exists());
    }

    #[test]
    fn test_quoted_fields_keep_commas_and_newlines() {
        let dir = TempDir::new().unwrap();
        let csv_path = write_csv(&dir, "data.csv", "title,body\nq,\"one, two\nthree\"\n");
        let extractor = Extractor::new(&csv_path, dir.path());

        let dataset = extractor.extract().unwrap();
        assert_eq!(dataset.num_rows(), 1);
        assert_eq!(dataset.value(0, "body"), Some("one, two\nthree"));
    }

    #[test]
    fn test_indented_json_uses_four_spaces() {
        let metadata = DatasetMetadata {
            num_rows: 0,
            num_columns: 1,
            columns: vec!["only".to_string()],
        };
        let json = to_indented_json(&metadata).unwrap();
        assert_eq!(
            json,
            "{\n    \"num_rows\": 0,\n    \"num_columns\": 1,\n    \"columns\": [\n        \"only\"\n    ]\n}"
        );
    }
}
