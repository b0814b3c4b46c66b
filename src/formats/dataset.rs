use anyhow::Result;
use async_trait::async_trait;

/// Metadata about a source file, available before its rows are decoded
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub file_size_bytes: u64,
    pub estimated_rows: Option<u64>,
}

/// A single record (row) rendered as text fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub fields: Vec<String>,
}

/// A fully materialized table: ordered column names plus every row
///
/// Values are rendered to text while the file is read, so a column that
/// cannot be rendered fails the read rather than the write.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    column_names: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(column_names: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            column_names,
            records,
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn num_rows(&self) -> usize {
        self.records.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_names.len()
    }
}

/// Trait for formats that load a whole file into a [`Dataset`]
#[async_trait]
pub trait DatasetReader: Send + Sync {
    /// Get metadata about the file
    async fn metadata(&self) -> Result<FileMetadata>;

    /// Decode every row of the file
    async fn read_dataset(&self) -> Result<Dataset>;
}
