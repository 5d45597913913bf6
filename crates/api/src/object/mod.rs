// Path: crates/api/src/object/mod.rs

//! Bucket/key blob storage for index snapshots and exported data files.

use async_trait::async_trait;
use hma_types::error::StoreError;

/// A flat object store addressed by bucket and key.
///
/// Writes are last-write-wins with no conditional-put support; callers that
/// race on one key simply overwrite each other.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` at `bucket/key`, replacing any previous object.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError>;

    /// Reads the object at `bucket/key`. `Ok(None)` if it does not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Lists the keys in `bucket` starting with `prefix`, sorted.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;
}
