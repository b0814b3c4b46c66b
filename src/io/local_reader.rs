use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, BufReader};

use super::byte_reader::ByteReader;

/// ByteReader implementation for local files
#[derive(Debug, Clone)]
pub struct LocalFileByteReader {
    file_path: PathBuf,
}

impl LocalFileByteReader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ByteReader for LocalFileByteReader {
    async fn size(&self) -> Result<u64> {
        let file = File::open(&self.file_path)
            .await
            .with_context(|| format!("Failed to open {}", self.file_path.display()))?;
        let size = file.metadata().await?.len();
        Ok(size)
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let file = File::open(&self.file_path)
            .await
            .with_context(|| format!("Failed to open {} for reading", self.file_path.display()))?;

        let file_size = file.metadata().await?.len();
        let end = std::cmp::min(end, file_size);
        if start >= end {
            return Ok(Vec::new());
        }

        let mut file = BufReader::new(file);
        file.seek(std::io::SeekFrom::Start(start)).await?;

        let size = (end - start) as usize;
        let mut buffer = vec![0u8; size];
        file.read_exact(&mut buffer)
            .await
            .with_context(|| format!("Failed to read bytes {}..{}", start, end))?;

        Ok(buffer)
    }
}
