//! Filesystem Storage

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::Storage;

/// Documents are files on disk, identified by path.
///
/// Writes replace the file in place so that watchers see a modification of
/// the same path rather than a create/rename pair.
#[derive(Debug, Clone, Default)]
pub struct FsStorage {
    root: Option<PathBuf>,
}

impl FsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report origins relative to `root`, like paths inside a vault
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

#[async_trait]
impl Storage for FsStorage {
    type Id = PathBuf;
    type Revision = ();

    async fn read(&self, path: &PathBuf) -> Result<(String, ())> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        Ok((text, ()))
    }

    async fn write(&self, path: &PathBuf, _: &(), text: &str) -> Result<()> {
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write document: {}", path.display()))
    }

    fn origin(&self, path: &PathBuf) -> String {
        self.root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path.as_path())
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_write_roundtrip() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("note.md");
        let storage = FsStorage::new();

        storage.write(&path, &(), "# Note\n").await.expect("write");
        let (text, ()) = storage.read(&path).await.expect("read");
        assert_eq!(text, "# Note\n");
    }

    #[tokio::test]
    async fn test_read_missing_file_names_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("missing.md");

        let err = FsStorage::new().read(&path).await.unwrap_err();
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_origin_is_relative_to_root() {
        let storage = FsStorage::with_root("/vault");
        assert_eq!(
            storage.origin(&PathBuf::from("/vault/daily/today.md")),
            Path::new("daily").join("today.md").display().to_string()
        );
        assert_eq!(storage.origin(&PathBuf::from("/elsewhere/x.md")), "/elsewhere/x.md");
        assert_eq!(FsStorage::new().origin(&PathBuf::from("a.md")), "a.md");
    }
}
