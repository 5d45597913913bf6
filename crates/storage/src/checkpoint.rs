// Path: crates/storage/src/checkpoint.rs
//! `CheckpointStore` backends: a redb table for durable runs and an in-memory map.

use async_trait::async_trait;
use hma_api::metadata::CheckpointStore;
use hma_types::app::{Checkpoint, CheckpointKey};
use hma_types::codec;
use hma_types::error::MetadataError;
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// key = [collaboration_id_be(8)][app_id_be(8)], value = bincode `Checkpoint`
const CHECKPOINTS: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("CHECKPOINTS");

fn unavailable<E: std::fmt::Display>(e: E) -> MetadataError {
    MetadataError::Unavailable(e.to_string())
}

/// Checkpoint rows persisted in a redb database.
///
/// Each `put` is a single write transaction on a single key, which gives the
/// all-or-nothing replacement the checkpoint manager needs for resets.
#[derive(Clone)]
pub struct RedbCheckpointStore {
    db: Arc<Database>,
}

impl RedbCheckpointStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let db = Database::create(path.as_ref()).map_err(unavailable)?;
        // Ensure the table exists so read transactions never see it missing.
        {
            let w = db.begin_write().map_err(unavailable)?;
            w.open_table(CHECKPOINTS).map_err(unavailable)?;
            w.commit().map_err(unavailable)?;
        }
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl CheckpointStore for RedbCheckpointStore {
    async fn get(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>, MetadataError> {
        let db = self.db.clone();
        let key = *key;
        tokio::task::spawn_blocking(move || {
            let r = db.begin_read().map_err(unavailable)?;
            let t = r.open_table(CHECKPOINTS).map_err(unavailable)?;
            let Some(raw) = t.get(&key.to_key_bytes()).map_err(unavailable)? else {
                return Ok(None);
            };
            codec::from_bytes::<Checkpoint>(raw.value())
                .map(Some)
                .map_err(|reason| MetadataError::Corrupt { key, reason })
        })
        .await
        .map_err(unavailable)?
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), MetadataError> {
        let db = self.db.clone();
        let key = checkpoint.key.to_key_bytes();
        let bytes = codec::to_bytes(checkpoint).map_err(MetadataError::Unavailable)?;
        tokio::task::spawn_blocking(move || {
            let w = db.begin_write().map_err(unavailable)?;
            {
                let mut t = w.open_table(CHECKPOINTS).map_err(unavailable)?;
                t.insert(&key, bytes.as_slice()).map_err(unavailable)?;
            }
            w.commit().map_err(unavailable)
        })
        .await
        .map_err(unavailable)?
    }
}

/// In-memory checkpoint rows for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryCheckpointStore {
    rows: Arc<RwLock<HashMap<CheckpointKey, Checkpoint>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>, MetadataError> {
        let rows = self.rows.read().map_err(|_| unavailable("lock poisoned"))?;
        Ok(rows.get(key).cloned())
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), MetadataError> {
        let mut rows = self.rows.write().map_err(|_| unavailable("lock poisoned"))?;
        rows.insert(checkpoint.key, checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hma_types::app::{CollaborationId, Cursor};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_redb_rows_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoints.redb");
        let key = CheckpointKey::new(CollaborationId(42), 7);

        {
            let store = RedbCheckpointStore::open(&path).unwrap();
            assert_eq!(store.get(&key).await.unwrap(), None);
            let mut cp = Checkpoint::at_origin(key, 100);
            cp.cursor = Cursor(55);
            cp.last_advanced_at = Some(120);
            store.put(&cp).await.unwrap();
        }

        let store = RedbCheckpointStore::open(&path).unwrap();
        let cp = store.get(&key).await.unwrap().unwrap();
        assert_eq!(cp.cursor, Cursor(55));
        assert_eq!(cp.last_advanced_at, Some(120));

        // Rows are keyed by (collaboration, app); another app sees nothing.
        let other = CheckpointKey::new(CollaborationId(42), 8);
        assert_eq!(store.get(&other).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_put_replaces_row() {
        let store = MemoryCheckpointStore::new();
        let key = CheckpointKey::new(CollaborationId(1), 1);
        let mut cp = Checkpoint::at_origin(key, 0);
        store.put(&cp).await.unwrap();
        cp.stale = true;
        store.put(&cp).await.unwrap();
        assert!(store.get(&key).await.unwrap().unwrap().stale);
    }
}
