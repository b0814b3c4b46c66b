//! Batch conversion of every Parquet file in a directory

pub mod converter;
pub mod discovery;

pub use converter::{BatchConverter, ConvertSummary, FailurePolicy, FileOutcome, FileResult};
pub use discovery::{FilePair, discover};
