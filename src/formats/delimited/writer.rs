use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{CSV_DELIMITER, CSV_QUOTE, CSV_TERMINATOR, WRITE_BUFFER_SIZE};
use crate::formats::Dataset;

/// Summary of one written file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub records_written: u64,
    pub bytes_written: u64,
}

/// Counts bytes passing through to the destination file
struct CountingWriter<W> {
    inner: W,
    bytes: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Writes a [`Dataset`] as comma separated text without a header row
///
/// Fields are quoted only when they contain the delimiter, the quote
/// character, or a line break. Lines end with the platform terminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedWriter;

impl DelimitedWriter {
    /// Create (or truncate) `path` and write every record of `dataset`
    ///
    /// A failure part way leaves the partially written file in place.
    pub fn write_file(&self, dataset: &Dataset, path: &Path) -> Result<WriteStats> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let sink = CountingWriter {
            inner: BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
            bytes: 0,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .quote(CSV_QUOTE)
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(CSV_TERMINATOR)
            .has_headers(false)
            .from_writer(sink);

        for (row_idx, record) in dataset.records().iter().enumerate() {
            csv_writer
                .write_record(&record.fields)
                .with_context(|| format!("Failed to write record {}", row_idx))?;
        }

        let sink = csv_writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush CSV writer")?;
        let CountingWriter { inner, bytes } = sink;
        inner
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush destination file")?
            .sync_all()
            .context("Failed to sync destination file")?;

        Ok(WriteStats {
            records_written: dataset.num_rows() as u64,
            bytes_written: bytes,
        })
    }
}
