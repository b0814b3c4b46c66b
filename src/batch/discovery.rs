//! Source file discovery and destination naming

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{DESTINATION_SUFFIX, SOURCE_SUFFIX};
use crate::error::ConvertError;

/// A source file and the CSV path it converts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl FilePair {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let destination = derive_destination(&source);
        Self {
            source,
            destination,
        }
    }
}

/// Whether a file name matches the source glob `*.parquet`
///
/// As with shell globbing, `*` does not match a leading dot.
pub fn matches_source_pattern(file_name: &str) -> bool {
    !file_name.starts_with('.') && file_name.ends_with(SOURCE_SUFFIX)
}

/// Replace the first occurrence of `.parquet` in the file name with `.csv`
///
/// `archive.parquet.parquet` becomes `archive.csv.parquet`. Only the file
/// name is rewritten; parent directories are kept as they are.
pub fn derive_destination(source: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => {
            let name = name.to_string_lossy();
            source.with_file_name(name.replacen(SOURCE_SUFFIX, DESTINATION_SUFFIX, 1))
        }
        None => source.to_path_buf(),
    }
}

/// List the `*.parquet` files directly inside `source_dir`
///
/// Directories whose name matches are skipped. Entries whose metadata cannot
/// be read (such as dangling symlinks) are kept so the read step reports them.
/// Results are sorted by file name.
pub async fn discover(source_dir: &Path) -> Result<Vec<FilePair>, ConvertError> {
    let discover_error = |source| ConvertError::Discover {
        dir: source_dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(source_dir)
        .await
        .map_err(discover_error)?;

    let mut pairs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(discover_error)? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!("Skipping non UTF-8 file name: {:?}", file_name);
            continue;
        };

        if !matches_source_pattern(name) {
            continue;
        }

        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {
                debug!("Skipping directory {}", path.display());
                continue;
            }
            Ok(_) => {}
            Err(e) => debug!("Cannot stat {}: {}", path.display(), e),
        }

        pairs.push(FilePair::new(path));
    }

    pairs.sort_by(|a, b| a.source.file_name().cmp(&b.source.file_name()));
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(pairs: &[FilePair]) -> Vec<String> {
        pairs
            .iter()
            .map(|p| p.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_matches_source_pattern() {
        assert!(matches_source_pattern("data.parquet"));
        assert!(matches_source_pattern("archive.parquet.parquet"));
        assert!(!matches_source_pattern("data.parquet.bak"));
        assert!(!matches_source_pattern("data.csv"));
        assert!(!matches_source_pattern(".hidden.parquet"));
        assert!(!matches_source_pattern(".parquet"));
        assert!(!matches_source_pattern("DATA.PARQUET"));
    }

    #[test]
    fn test_derive_destination() {
        assert_eq!(
            derive_destination(Path::new("data.parquet")),
            PathBuf::from("data.csv")
        );
        assert_eq!(
            derive_destination(Path::new("archive.parquet.parquet")),
            PathBuf::from("archive.csv.parquet")
        );
        assert_eq!(
            derive_destination(Path::new("my.parquet_files.parquet")),
            PathBuf::from("my.csv_files.parquet")
        );
    }

    #[test]
    fn test_derive_destination_keeps_parent_directories() {
        assert_eq!(
            derive_destination(Path::new("/srv/x.parquet/part.parquet")),
            PathBuf::from("/srv/x.parquet/part.csv")
        );
    }

    #[tokio::test]
    async fn test_discover_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in [
            "b.parquet",
            "a.parquet",
            "notes.txt",
            "c.parquet.bak",
            ".hidden.parquet",
            "archive.parquet.parquet",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.parquet")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("deep.parquet"), b"").unwrap();

        let pairs = discover(dir.path()).await.unwrap();

        assert_eq!(
            names(&pairs),
            vec!["a.parquet", "archive.parquet.parquet", "b.parquet"]
        );
        assert_eq!(pairs[0].destination, dir.path().join("a.csv"));
        assert_eq!(pairs[1].destination, dir.path().join("archive.csv.parquet"));
    }

    #[tokio::test]
    async fn test_discover_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");

        let err = discover(&missing).await.unwrap_err();
        assert!(matches!(err, ConvertError::Discover { .. }));
        assert_eq!(err.path(), missing.as_path());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_is_kept() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.parquet"), dir.path().join("x.parquet"))
            .unwrap();

        let pairs = discover(dir.path()).await.unwrap();

        assert_eq!(names(&pairs), vec!["x.parquet"]);
        assert_eq!(pairs[0].destination, dir.path().join("x.csv"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_followed() {
        let dir = TempDir::new().unwrap();
        let target_dir = dir.path().join("real_dir");
        std::fs::create_dir(&target_dir).unwrap();
        std::fs::write(dir.path().join("real.data"), b"").unwrap();

        std::os::unix::fs::symlink(&target_dir, dir.path().join("linked_dir.parquet")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.data"), dir.path().join("linked.parquet"))
            .unwrap();

        let pairs = discover(dir.path()).await.unwrap();

        assert_eq!(names(&pairs), vec!["linked.parquet"]);
    }
}
