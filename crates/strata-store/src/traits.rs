use async_trait::async_trait;

use crate::error::StoreResult;

/// Key-addressed blob storage used by the Storage tier.
///
/// Implementations must satisfy:
/// - `write` overwrites any existing blob under the key; it never appends.
/// - `write` is not atomic. A failure may leave a partial blob behind.
/// - Errors are returned, never retried or swallowed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the whole blob stored under `key`.
    async fn read(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Replace the blob stored under `key` with `data`.
    async fn write(&self, key: &str, data: &[u8]) -> StoreResult<()>;
}
