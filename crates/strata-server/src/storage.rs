use std::sync::Arc;

use async_trait::async_trait;
use strata_protocol::{Response, StorageRequest};
use strata_store::{BlobStore, FsBlobStore};
use tracing::debug;

use crate::config::{StorageConfig, StorageLayout};
use crate::error::{ServerError, ServerResult};
use crate::service::LineService;

/// Reason sent for a blob whose bytes would split the `OK` reply.
pub const UNFRAMEABLE_BLOB: &str = "blob contains a newline and cannot be framed";

/// Persistence tier: reads and writes blobs by key.
///
/// Store failures become `FAIL: <reason>` on the same connection; nothing is
/// retried.
pub struct StorageService {
    store: Arc<dyn BlobStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Filesystem-backed service laid out as `config` describes.
    ///
    /// The flat layout is confined to `root` when one is set and verbatim
    /// otherwise. The sharded layout requires a root.
    pub fn from_config(config: &StorageConfig) -> ServerResult<Self> {
        let store = match (config.layout, &config.root) {
            (StorageLayout::Flat, Some(root)) => FsBlobStore::confined(root),
            (StorageLayout::Flat, None) => FsBlobStore::verbatim(),
            (StorageLayout::Sharded, Some(root)) => FsBlobStore::sharded(root, config.shard_depth),
            (StorageLayout::Sharded, None) => {
                return Err(ServerError::Config(
                    "storage.layout = \"sharded\" requires storage.root".to_owned(),
                ))
            }
        };
        Ok(Self::new(Arc::new(store)))
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

#[async_trait]
impl LineService for StorageService {
    type Session = ();

    fn name(&self) -> &'static str {
        "storage"
    }

    fn open_session(&self) -> Self::Session {}

    async fn handle(&self, _session: &mut Self::Session, line: &str) -> Response {
        match StorageRequest::parse(line) {
            Ok(StorageRequest::Get { path }) => match self.store.read(&path).await {
                Ok(bytes) if bytes.contains(&b'\n') => {
                    debug!(%path, bytes = bytes.len(), "blob spans several lines");
                    Response::fail(UNFRAMEABLE_BLOB)
                }
                Ok(bytes) => Response::Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
                Err(err) => {
                    debug!(%path, %err, "blob read failed");
                    Response::fail(err)
                }
            },
            Ok(StorageRequest::Post { path, body }) => {
                match self.store.write(&path, body.as_bytes()).await {
                    Ok(()) => Response::Ok(None),
                    Err(err) => {
                        debug!(%path, %err, "blob write failed");
                        Response::fail(err)
                    }
                }
            }
            Err(err) => {
                debug!(%err, "rejecting storage command");
                Response::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::InMemoryBlobStore;

    #[tokio::test]
    async fn post_then_get_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let service = StorageService::from_config(&StorageConfig::default()).unwrap();

        let post = format!("POST {} hello", path.display());
        assert_eq!(service.handle(&mut (), &post).await, Response::Ok(None));
        let get = format!("GET {}", path.display());
        assert_eq!(
            service.handle(&mut (), &get).await,
            Response::Ok(Some("hello".into()))
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn get_missing_path_fails_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let service = StorageService::from_config(&StorageConfig::default()).unwrap();
        let get = format!("GET {}", dir.path().join("absent").display());
        match service.handle(&mut (), &get).await {
            Response::Fail(reason) => {
                assert!(reason.contains("absent"), "{reason}");
                assert!(reason.contains("open"), "{reason}");
            }
            other => panic!("expected FAIL, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let service = StorageService::from_config(&StorageConfig::default()).unwrap();
        let post = format!("POST {} x", dir.path().join("missing/dir/file").display());
        assert!(matches!(service.handle(&mut (), &post).await, Response::Fail(_)));
    }

    #[tokio::test]
    async fn confined_root_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            root: Some(dir.path().to_path_buf()),
            ..StorageConfig::default()
        };
        let service = StorageService::from_config(&config).unwrap();
        assert_eq!(service.handle(&mut (), "POST obj data").await, Response::Ok(None));
        assert_eq!(std::fs::read(dir.path().join("obj")).unwrap(), b"data");

        match service.handle(&mut (), "GET ../obj").await {
            Response::Fail(reason) => assert!(reason.starts_with("path rejected"), "{reason}"),
            other => panic!("expected FAIL, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn shape_errors() {
        let service = StorageService::new(Arc::new(InMemoryBlobStore::new()));
        for line in ["", "GET", "GET a b", "POST a", "POST a b c", "PUT a b"] {
            assert_eq!(service.handle(&mut (), line).await, Response::Error, "{line:?}");
        }
    }

    #[tokio::test]
    async fn in_memory_backend() {
        let store = Arc::new(InMemoryBlobStore::new());
        let service = StorageService::new(store.clone());
        assert_eq!(service.handle(&mut (), "POST k v").await, Response::Ok(None));
        assert_eq!(service.handle(&mut (), "GET k").await, Response::Ok(Some("v".into())));
        assert_eq!(store.keys(), vec!["k"]);
        assert_eq!(
            service.handle(&mut (), "GET other").await,
            Response::Fail("blob not found: other".into())
        );
    }

    #[tokio::test]
    async fn multi_line_blob_fails_instead_of_splitting_reply() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("k"), b"line1\nline2").unwrap();
        let config = StorageConfig {
            root: Some(dir.path().to_path_buf()),
            ..StorageConfig::default()
        };
        let service = StorageService::from_config(&config).unwrap();

        let reply = service.handle(&mut (), "GET k").await;
        assert_eq!(reply, Response::Fail(UNFRAMEABLE_BLOB.into()));
        assert_eq!(reply.encode().matches('\n').count(), 1);
        assert_eq!(service.handle(&mut (), "POST other v").await, Response::Ok(None));
    }

    #[tokio::test]
    async fn sharded_layout_hides_key_structure() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            root: Some(dir.path().to_path_buf()),
            layout: StorageLayout::Sharded,
            ..StorageConfig::default()
        };
        let service = StorageService::from_config(&config).unwrap();

        assert_eq!(service.handle(&mut (), "POST ../escape data").await, Response::Ok(None));
        assert_eq!(
            service.handle(&mut (), "GET ../escape").await,
            Response::Ok(Some("data".into()))
        );
        assert!(!dir.path().parent().unwrap().join("escape").exists());
    }

    #[test]
    fn sharded_layout_requires_root() {
        let config = StorageConfig {
            layout: StorageLayout::Sharded,
            ..StorageConfig::default()
        };
        assert!(matches!(
            StorageService::from_config(&config),
            Err(ServerError::Config(_))
        ));
    }
}
