//! File format readers and writers

pub mod dataset;
pub mod delimited;
pub mod parquet;

pub use dataset::{Dataset, DatasetReader, FileMetadata, Record};
pub use delimited::{DelimitedWriter, WriteStats};
