//! Parquet file reader implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use parquet::file::metadata::ParquetMetaData;
use std::sync::Arc;
use tracing::debug;

use crate::formats::{Dataset, DatasetReader, FileMetadata};
use crate::io::ByteReader;

use super::adapter::RangeReadAdapter;
use super::conversion::record_batch_to_records;
use super::pandas;

/// Parquet file reader that works with any ByteReader implementation
pub struct GenericParquetReader<R: ByteReader> {
    reader: Arc<R>,
    metadata: ArrowReaderMetadata,
    /// Top-level columns written out; pandas index columns are left out
    data_columns: Vec<usize>,
    total_rows: u64,
}

impl<R: ByteReader + 'static> GenericParquetReader<R> {
    /// Create a new reader by decoding the file footer
    ///
    /// Fails if the source is not a valid Parquet file or its footer reports
    /// an impossible row count.
    pub async fn new(reader: R) -> Result<Self> {
        let reader = Arc::new(reader);
        let mut adapter = Self::adapter(&reader).await?;
        let metadata = ArrowReaderMetadata::load_async(&mut adapter, ArrowReaderOptions::new())
            .await
            .context("Failed to read Parquet metadata")?;

        let total_rows =
            count_rows(metadata.metadata()).context("Failed to read Parquet metadata")?;

        let index_columns = pandas::index_columns(metadata.schema());
        let data_columns = metadata
            .schema()
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| !index_columns.contains(field.name()))
            .map(|(idx, _)| idx)
            .collect();
        if !index_columns.is_empty() {
            debug!(?index_columns, "dropping pandas index columns");
        }

        Ok(Self {
            reader,
            metadata,
            data_columns,
            total_rows,
        })
    }

    async fn adapter(reader: &Arc<R>) -> Result<RangeReadAdapter<R>> {
        RangeReadAdapter::new(Arc::clone(reader))
            .await
            .context("Failed to create ByteReader adapter")
    }
}

/// Sum the row group row counts, rejecting negative or overflowing totals
fn count_rows(metadata: &ParquetMetaData) -> Result<u64> {
    metadata
        .row_groups()
        .iter()
        .enumerate()
        .try_fold(0u64, |total, (idx, row_group)| {
            let rows = u64::try_from(row_group.num_rows()).with_context(|| {
                format!(
                    "Row group {} reports {} rows",
                    idx,
                    row_group.num_rows()
                )
            })?;
            total
                .checked_add(rows)
                .with_context(|| format!("Row count overflows at row group {}", idx))
        })
}

#[async_trait]
impl<R: ByteReader + 'static> DatasetReader for GenericParquetReader<R> {
    async fn metadata(&self) -> Result<FileMetadata> {
        let file_size_bytes = self.reader.size().await?;

        Ok(FileMetadata {
            file_size_bytes,
            estimated_rows: Some(self.total_rows),
        })
    }

    async fn read_dataset(&self) -> Result<Dataset> {
        let parquet_metadata = self.metadata.metadata();
        let projection = ProjectionMask::roots(
            parquet_metadata.file_metadata().schema_descr(),
            self.data_columns.iter().copied(),
        );

        let adapter = Self::adapter(&self.reader).await?;
        let stream = ParquetRecordBatchStreamBuilder::new_with_metadata(
            adapter,
            self.metadata.clone(),
        )
        .with_projection(projection)
        .build()
        .context("Failed to build Parquet stream")?;

        let schema = self.metadata.schema();
        let column_names = self
            .data_columns
            .iter()
            .map(|&idx| schema.field(idx).name().clone())
            .collect();

        // Footer row counts are not trusted for sizing
        let mut records = Vec::new();

        let mut stream = Box::pin(stream);
        while let Some(batch_result) = stream.next().await {
            let batch = batch_result.context("Failed to read record batch")?;
            let batch_records = record_batch_to_records(&batch)
                .context("Failed to convert RecordBatch to Records")?;
            records.extend(batch_records);
        }

        let dataset = Dataset::new(column_names, records);
        debug!(
            row_groups = parquet_metadata.num_row_groups(),
            rows = dataset.num_rows(),
            columns = ?dataset.column_names(),
            "decoded parquet file"
        );

        Ok(dataset)
    }
}
