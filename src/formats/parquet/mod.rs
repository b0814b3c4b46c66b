//! Parquet file format support.
//!
//! This module loads Apache Parquet files into memory. It includes:
//! - RangeReadAdapter bridging ByteReader to Arrow's AsyncRead+AsyncSeek interface
//! - Conversion from Arrow RecordBatches to row-based Records
//! - Detection of pandas index columns, which are not written out
//! - GenericParquetReader that implements the DatasetReader trait

mod adapter;
mod conversion;
mod pandas;
mod reader;

pub use reader::GenericParquetReader;
