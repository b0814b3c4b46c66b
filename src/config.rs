//! Configuration constants for the converter
//!
//! This module centralizes the fixed naming rules and I/O tunables used
//! throughout the application.

// ============================================================================
// Naming
// ============================================================================

/// Suffix selecting source files (glob `*.parquet`)
pub const SOURCE_SUFFIX: &str = ".parquet";

/// Replacement for the first occurrence of [`SOURCE_SUFFIX`] in a source name
pub const DESTINATION_SUFFIX: &str = ".csv";

// ============================================================================
// CSV Output
// ============================================================================

pub const CSV_DELIMITER: u8 = b',';

pub const CSV_QUOTE: u8 = b'"';

/// Platform line terminator for written records
#[cfg(windows)]
pub const CSV_TERMINATOR: csv::Terminator = csv::Terminator::CRLF;

/// Platform line terminator for written records
#[cfg(not(windows))]
pub const CSV_TERMINATOR: csv::Terminator = csv::Terminator::Any(b'\n');

/// Buffer size of the destination file writer
///
/// Set to 64KB so that wide rows are flushed in a handful of syscalls.
pub const WRITE_BUFFER_SIZE: usize = 64 * 1024; // 64 KB

// ============================================================================
// I/O Configuration
// ============================================================================

/// Buffer size for parquet async I/O adapter
///
/// Set to 256KB to optimize for parquet's columnar format and compression.
/// Larger buffers reduce the number of range reads issued while the footer
/// and column chunks are decoded.
pub const PARQUET_BUFFER_SIZE: usize = 256 * 1024; // 256 KB
