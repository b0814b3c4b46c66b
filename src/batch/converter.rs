use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::discovery::FilePair;
use crate::error::ConvertError;
use crate::formats::parquet::GenericParquetReader;
use crate::formats::{Dataset, DatasetReader, DelimitedWriter, WriteStats};
use crate::io::LocalFileByteReader;

/// What to do when one file of the batch fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the batch on the first error; earlier outputs stay on disk
    #[default]
    FailFast,
    /// Record the error for that file and carry on with the next one
    ContinueOnError,
}

/// Final state of one file in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Converted { rows: u64, columns: usize },
    Failed(String),
    /// Listed by a dry run, not converted
    Planned,
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub pair: FilePair,
    pub result: FileResult,
}

/// Result of a batch conversion
#[derive(Debug, Clone, Default)]
pub struct ConvertSummary {
    pub files: Vec<FileOutcome>,
    pub duration: Duration,
}

impl ConvertSummary {
    pub fn converted(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.result, FileResult::Converted { .. }))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|f| matches!(f.result, FileResult::Failed(_)))
    }

    pub fn rows_written(&self) -> u64 {
        self.files
            .iter()
            .map(|f| match f.result {
                FileResult::Converted { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }
}

/// Converts a list of Parquet files to CSV one after another
pub struct BatchConverter {
    policy: FailurePolicy,
    writer: DelimitedWriter,
    quiet: bool,
}

impl BatchConverter {
    pub fn new(policy: FailurePolicy, writer: DelimitedWriter, quiet: bool) -> Self {
        Self {
            policy,
            writer,
            quiet,
        }
    }

    /// Convert every pair in order
    ///
    /// Under [`FailurePolicy::FailFast`] the first error is returned and the
    /// remaining pairs are never attempted.
    pub async fn convert_all(&self, pairs: &[FilePair]) -> Result<ConvertSummary, ConvertError> {
        let start_time = Instant::now();
        let progress = self.progress_bar(pairs.len() as u64);

        let mut files = Vec::with_capacity(pairs.len());
        for pair in pairs {
            progress.set_message(pair.source.display().to_string());

            let result = match self.convert_file(pair).await {
                Ok((dataset_rows, columns)) => FileResult::Converted {
                    rows: dataset_rows,
                    columns,
                },
                Err(e) if self.policy == FailurePolicy::ContinueOnError => {
                    let message = format!("{:#}", anyhow::Error::from(e));
                    warn!("Skipping {}: {}", pair.source.display(), message);
                    FileResult::Failed(message)
                }
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            };

            files.push(FileOutcome {
                pair: pair.clone(),
                result,
            });
            progress.inc(1);
        }

        progress.finish_and_clear();

        let summary = ConvertSummary {
            files,
            duration: start_time.elapsed(),
        };
        info!(
            "Conversion complete: {} converted, {} failed, {} rows in {:.2}s",
            summary.converted(),
            summary.failed().count(),
            summary.rows_written(),
            summary.duration.as_secs_f64()
        );
        Ok(summary)
    }

    /// Read one source completely, then write its destination
    ///
    /// Returns the row and column counts written.
    pub async fn convert_file(&self, pair: &FilePair) -> Result<(u64, usize), ConvertError> {
        let dataset = read_parquet(pair).await?;

        let stats: WriteStats = self
            .writer
            .write_file(&dataset, &pair.destination)
            .map_err(|e| ConvertError::write(&pair.destination, e))?;

        info!(
            "Converted {} -> {} ({} rows, {} bytes)",
            pair.source.display(),
            pair.destination.display(),
            stats.records_written,
            stats.bytes_written
        );

        Ok((stats.records_written, dataset.num_columns()))
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] Files: [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar
    }
}

async fn read_parquet(pair: &FilePair) -> Result<Dataset, ConvertError> {
    let read_error = |e| ConvertError::read(&pair.source, e);

    let byte_reader = LocalFileByteReader::new(&pair.source);
    let reader = GenericParquetReader::new(byte_reader)
        .await
        .map_err(read_error)?;

    let metadata = reader.metadata().await.map_err(read_error)?;
    info!(
        "Reading {} ({} bytes, {} rows)",
        pair.source.display(),
        metadata.file_size_bytes,
        metadata.estimated_rows.unwrap_or(0)
    );

    reader.read_dataset().await.map_err(read_error)
}
