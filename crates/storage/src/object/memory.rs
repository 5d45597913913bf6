// Path: crates/storage/src/object/memory.rs
use super::validate_location;
use async_trait::async_trait;
use hma_api::object::ObjectStore;
use hma_types::error::StoreError;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory object store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryObjectStore {
    // (bucket, key) -> body
    objects: Arc<RwLock<BTreeMap<(String, String), Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("object map lock poisoned".into())
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        validate_location(bucket, key)?;
        self.objects
            .write()
            .map_err(|_| poisoned())?
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_location(bucket, key)?;
        Ok(self
            .objects
            .read()
            .map_err(|_| poisoned())?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }
}
