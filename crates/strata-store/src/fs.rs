use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::path::{ConfinedRoot, PathPolicy, ShardedRoot, VerbatimPaths};
use crate::traits::BlobStore;

/// Blob store backed by plain files, one file per key.
pub struct FsBlobStore {
    policy: Arc<dyn PathPolicy>,
}

impl FsBlobStore {
    pub fn new(policy: Arc<dyn PathPolicy>) -> Self {
        Self { policy }
    }

    /// Keys are used as filesystem paths unchanged.
    pub fn verbatim() -> Self {
        Self::new(Arc::new(VerbatimPaths))
    }

    /// Keys are confined beneath `root`.
    pub fn confined(root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(ConfinedRoot::new(root)))
    }

    /// Keys are hashed into a `depth`-level directory tree beneath `root`.
    pub fn sharded(root: impl Into<std::path::PathBuf>, depth: usize) -> Self {
        Self::new(Arc::new(ShardedRoot::new(root, depth)))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.policy.resolve(key)?;
        debug!(path = %path.display(), "reading blob");
        let result = tokio::fs::read(&path).await;
        result.map_err(|source| StoreError::Io { op: "open", path, source })
    }

    async fn write(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.policy.resolve(key)?;
        debug!(path = %path.display(), bytes = data.len(), "writing blob");
        if self.policy.creates_parents() {
            if let Some(parent) = path.parent() {
                let created = tokio::fs::create_dir_all(parent).await;
                created.map_err(|source| StoreError::Io {
                    op: "create directory",
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let result = tokio::fs::write(&path, data).await;
        result.map_err(|source| StoreError::Io { op: "write", path, source })
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let key = path.to_str().unwrap();

        let store = FsBlobStore::verbatim();
        store.write(key, b"hello").await.unwrap();
        assert_eq!(store.read(key).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::confined(dir.path());
        store.write("k", b"first-and-longer").await.unwrap();
        store.write("k", b"second").await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), b"second");
        assert_eq!(std::fs::read(dir.path().join("k")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn missing_blob_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::confined(dir.path());
        let err = store.read("absent").await.unwrap_err();
        match err {
            StoreError::Io { op, source, .. } => {
                assert_eq!(op, "open");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::confined(dir.path());
        let err = store.write("no/such/dir/file", b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { op: "write", .. }));
    }

    #[tokio::test]
    async fn confined_store_rejects_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::confined(dir.path());
        let err = store.write("../escape", b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::PathRejected { .. }));
        assert!(!dir.path().parent().unwrap().join("escape").exists());
    }

    #[tokio::test]
    async fn sharded_store_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::sharded(dir.path(), 2);
        store.write("ab12c", b"payload").await.unwrap();
        assert_eq!(store.read("ab12c").await.unwrap(), b"payload");

        let path = ShardedRoot::new(dir.path(), 2).resolve("ab12c").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        assert_eq!(path.parent().unwrap().parent().unwrap().parent().unwrap(), dir.path());
    }

    #[tokio::test]
    async fn sharded_store_reports_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::sharded(dir.path(), 2);
        assert!(matches!(store.read("never-written").await, Err(StoreError::Io { op: "open", .. })));
    }
}
