//! High-level runner API for the converter.
//!
//! This module provides the public interface used by the CLI: it wires
//! discovery, the Parquet reader, and the CSV writer together.

use anyhow::Result;
use derive_builder::Builder;
use std::path::PathBuf;
use tracing::info;

use crate::batch::{self, BatchConverter};
use crate::formats::DelimitedWriter;

pub use crate::batch::{ConvertSummary, FailurePolicy, FileOutcome, FileResult, FilePair};
pub use crate::error::ConvertError;

/// Arguments for a conversion run
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ConvertArgs {
    /// Directory scanned for `*.parquet` files
    #[builder(default = "PathBuf::from(\".\")")]
    pub source_dir: PathBuf,

    #[builder(default)]
    pub failure_policy: FailurePolicy,

    /// List the planned conversions without reading or writing files
    #[builder(default)]
    pub dry_run: bool,

    #[builder(default)]
    pub quiet: bool,
}

/// Convert every `*.parquet` file of `args.source_dir` to CSV
///
/// # Example
///
/// ```no_run
/// use parquet_csv_batch::runner::{ConvertArgsBuilder, run_convert};
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = ConvertArgsBuilder::default()
///     .source_dir("/data/exports")
///     .build()?;
///
/// let summary = run_convert(args).await?;
/// println!("Converted {} files", summary.converted());
/// # Ok(())
/// # }
/// ```
pub async fn run_convert(args: ConvertArgs) -> Result<ConvertSummary> {
    let pairs = batch::discover(&args.source_dir).await?;
    info!(
        "Found {} parquet file(s) in {}",
        pairs.len(),
        args.source_dir.display()
    );

    if args.dry_run {
        return Ok(ConvertSummary {
            files: pairs
                .into_iter()
                .map(|pair| FileOutcome {
                    pair,
                    result: FileResult::Planned,
                })
                .collect(),
            ..ConvertSummary::default()
        });
    }

    let converter = BatchConverter::new(
        args.failure_policy,
        DelimitedWriter,
        args.quiet,
    );
    let summary = converter.convert_all(&pairs).await?;
    Ok(summary)
}
