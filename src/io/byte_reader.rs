use anyhow::Result;
use async_trait::async_trait;

/// Abstraction for byte-level I/O operations
/// The Parquet reader decodes through this trait so that the footer and
/// column chunks are fetched as byte ranges rather than one sequential stream
#[async_trait]
pub trait ByteReader: Send + Sync {
    /// Get the total size of the file in bytes
    async fn size(&self) -> Result<u64>;

    /// Read a range of bytes from the file
    /// Returns the bytes read (may be less than requested if EOF is reached)
    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>>;
}
