//! Media file storage.
//!
//! The API computes storage paths and content-type checks; actually holding
//! bytes is behind the [`FileStore`] trait so the backing store can be swapped.

mod paths;

pub use paths::*;

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::errors::AppError;

/// Collaborator that persists uploaded file bytes.
///
/// `store` takes the resolver-computed relative path and returns the stored
/// reference; here the reference is that same path.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, path: &str, bytes: Bytes) -> Result<String, AppError>;
    async fn delete(&self, reference: &str) -> Result<(), AppError>;
}

/// File store writing under a local media root directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, path: &str, bytes: Bytes) -> Result<String, AppError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Truncates any existing file at the same path: identical titles
        // overwrite prior uploads.
        tokio::fs::write(&target, &bytes).await?;
        tracing::debug!("Stored {} bytes at {:?}", bytes.len(), target);
        Ok(path.to_string())
    }

    async fn delete(&self, reference: &str) -> Result<(), AppError> {
        let target = self.resolve(reference);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp.path().to_path_buf());

        let reference = store
            .store("music/songs/audio/Test.mp3", Bytes::from_static(b"abc"))
            .await
            .unwrap();
        assert_eq!(reference, "music/songs/audio/Test.mp3");

        let on_disk = temp.path().join("music/songs/audio/Test.mp3");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"abc");

        store.delete(&reference).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_store_overwrites_same_path() {
        let temp = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp.path().to_path_buf());

        store
            .store("music/songs/audio/Same.mp3", Bytes::from_static(b"first"))
            .await
            .unwrap();
        store
            .store("music/songs/audio/Same.mp3", Bytes::from_static(b"second"))
            .await
            .unwrap();

        let on_disk = temp.path().join("music/songs/audio/Same.mp3");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let temp = TempDir::new().unwrap();
        let store = LocalFileStore::new(temp.path().to_path_buf());
        store.delete("music/songs/audio/Ghost.mp3").await.unwrap();
    }
}
