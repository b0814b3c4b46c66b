//! Error types surfaced by a conversion run

use std::path::PathBuf;

/// Boxed cause carried by [`ConvertError`] variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a conversion run, tagged with the path it concerns
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The source directory could not be listed
    #[error("failed to list source directory {}", .dir.display())]
    Discover {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is missing, unreadable, or not valid Parquet
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// A destination file could not be created or written
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl ConvertError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        ConvertError::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        ConvertError::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Path of the file or directory the failure concerns
    pub fn path(&self) -> &std::path::Path {
        match self {
            ConvertError::Discover { dir, .. } => dir,
            ConvertError::Read { path, .. } | ConvertError::Write { path, .. } => path,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, ConvertError::Read { .. })
    }

    pub fn is_write(&self) -> bool {
        matches!(self, ConvertError::Write { .. })
    }
}
