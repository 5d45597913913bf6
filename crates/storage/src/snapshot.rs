// Path: crates/storage/src/snapshot.rs
//! The type-keyed index snapshot store.
//!
//! Every [`SignalIndex`] type owns exactly one object per bucket, at
//! `index/{fully-qualified-name}.index`. The object holds a small envelope that
//! records which type wrote it, so loading a snapshot as the wrong type fails
//! with a `Corrupt` error instead of producing garbage.
//!
//! Saves are a single whole-object `put`. Two writers saving the same type to
//! the same bucket race and the last `put` wins.

use async_trait::async_trait;
use hma_api::index::{IndexStore, IndexTypeId, SignalIndex};
use hma_api::object::ObjectStore;
use hma_types::codec;
use hma_types::error::SnapshotError;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Serialize, Deserialize)]
struct SnapshotEnvelope {
    type_name: String,
    payload: Vec<u8>,
}

/// Binds storage names to Rust types for the lifetime of a store.
///
/// A name may be claimed any number of times by the same type; a second type
/// claiming it is rejected, since both would read and overwrite one object.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    claimed: Mutex<HashMap<&'static str, TypeId>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `I` owns `I::TYPE_ID`, validating the name on first use.
    pub fn claim<I: SignalIndex>(&self) -> Result<IndexTypeId, SnapshotError> {
        let id = I::TYPE_ID;
        let mut claimed = self.claimed.lock().unwrap_or_else(|p| p.into_inner());
        match claimed.get(id.name()) {
            Some(owner) if *owner == TypeId::of::<I>() => Ok(id),
            Some(_) => Err(SnapshotError::DuplicateType(id.name())),
            None => {
                id.validate().map_err(|reason| SnapshotError::Encode {
                    type_name: id.name(),
                    reason,
                })?;
                claimed.insert(id.name(), TypeId::of::<I>());
                Ok(id)
            }
        }
    }

    /// Number of distinct names claimed so far.
    pub fn len(&self) -> usize {
        self.claimed.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Saves and loads index snapshots through any [`ObjectStore`].
#[derive(Debug)]
pub struct SnapshotIndexStore<O> {
    objects: O,
    registry: IndexRegistry,
}

impl<O: ObjectStore> SnapshotIndexStore<O> {
    pub fn new(objects: O) -> Self {
        Self {
            objects,
            registry: IndexRegistry::new(),
        }
    }

    /// The underlying object store.
    pub fn objects(&self) -> &O {
        &self.objects
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }
}

#[async_trait]
impl<O: ObjectStore> IndexStore for SnapshotIndexStore<O> {
    async fn save<I: SignalIndex>(&self, index: &I, bucket: &str) -> Result<(), SnapshotError> {
        let id = self.registry.claim::<I>()?;
        let payload = codec::to_bytes(index).map_err(|reason| SnapshotError::Encode {
            type_name: id.name(),
            reason,
        })?;
        let envelope = SnapshotEnvelope {
            type_name: id.name().to_string(),
            payload,
        };
        let body = codec::to_bytes(&envelope).map_err(|reason| SnapshotError::Encode {
            type_name: id.name(),
            reason,
        })?;
        let key = id.storage_key();
        let size = body.len();
        self.objects.put(bucket, &key, body).await?;
        tracing::debug!(target: "snapshot", bucket, key = %key, bytes = size, "saved index snapshot");
        Ok(())
    }

    async fn load<I: SignalIndex>(&self, bucket: &str) -> Result<I, SnapshotError> {
        let id = self.registry.claim::<I>()?;
        let key = id.storage_key();
        let Some(body) = self.objects.get(bucket, &key).await? else {
            return Err(SnapshotError::NotFound {
                bucket: bucket.to_string(),
                key,
            });
        };
        let envelope: SnapshotEnvelope =
            codec::from_bytes(&body).map_err(|reason| SnapshotError::Corrupt {
                key: key.clone(),
                reason,
            })?;
        if envelope.type_name != id.name() {
            return Err(SnapshotError::Corrupt {
                key,
                reason: format!(
                    "written by {:?}, requested as {:?}",
                    envelope.type_name,
                    id.name()
                ),
            });
        }
        let index = codec::from_bytes(&envelope.payload)
            .map_err(|reason| SnapshotError::Corrupt { key: key.clone(), reason })?;
        tracing::debug!(target: "snapshot", bucket, key = %key, bytes = body.len(), "loaded index snapshot");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{FsObjectStore, MemoryObjectStore};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct HashSetIndex {
        entries: BTreeMap<String, Vec<String>>,
    }
    impl SignalIndex for HashSetIndex {
        const TYPE_ID: IndexTypeId = IndexTypeId::new("tests.snapshot.HashSetIndex");
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct OtherIndex {
        threshold: u32,
    }
    impl SignalIndex for OtherIndex {
        const TYPE_ID: IndexTypeId = IndexTypeId::new("tests.snapshot.OtherIndex");
    }

    // Deliberately reuses HashSetIndex's name.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Impostor {
        threshold: u32,
    }
    impl SignalIndex for Impostor {
        const TYPE_ID: IndexTypeId = IndexTypeId::new("tests.snapshot.HashSetIndex");
    }

    fn sample() -> HashSetIndex {
        let mut entries = BTreeMap::new();
        entries.insert("d41d8cd98f00b204e9800998ecf8427e".into(), vec!["100".into()]);
        entries.insert("9e107d9d372bb6826bd81d3542a419d6".into(), vec!["200".into(), "201".into()]);
        HashSetIndex { entries }
    }

    #[tokio::test]
    async fn test_save_then_load_on_fs() {
        let dir = tempdir().unwrap();
        let store = SnapshotIndexStore::new(FsObjectStore::new(dir.path()).unwrap());
        store.save(&sample(), "hma-data").await.unwrap();

        assert!(dir
            .path()
            .join("hma-data/index/tests.snapshot.HashSetIndex.index")
            .is_file());
        let loaded: HashSetIndex = store.load("hma-data").await.unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_types_do_not_collide() {
        let store = SnapshotIndexStore::new(MemoryObjectStore::new());
        store.save(&sample(), "b").await.unwrap();
        store.save(&OtherIndex { threshold: 31 }, "b").await.unwrap();

        let keys = store.objects().list("b", "index/").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "index/tests.snapshot.HashSetIndex.index".to_string(),
                "index/tests.snapshot.OtherIndex.index".to_string(),
            ]
        );
        assert_eq!(store.load::<HashSetIndex>("b").await.unwrap(), sample());
        assert_eq!(
            store.load::<OtherIndex>("b").await.unwrap(),
            OtherIndex { threshold: 31 }
        );
    }

    #[tokio::test]
    async fn test_second_save_replaces_first() {
        let store = SnapshotIndexStore::new(MemoryObjectStore::new());
        store.save(&OtherIndex { threshold: 1 }, "b").await.unwrap();
        store.save(&OtherIndex { threshold: 2 }, "b").await.unwrap();
        assert_eq!(store.objects().len(), 1);
        assert_eq!(store.load::<OtherIndex>("b").await.unwrap().threshold, 2);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_not_found() {
        let store = SnapshotIndexStore::new(MemoryObjectStore::new());
        store.save(&sample(), "b").await.unwrap();
        let err = store.load::<OtherIndex>("b").await.unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { ref key, .. }
            if key == "index/tests.snapshot.OtherIndex.index"));
        // Same type, other bucket.
        assert!(matches!(
            store.load::<HashSetIndex>("elsewhere").await.unwrap_err(),
            SnapshotError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_garbage_is_corrupt() {
        let objects = MemoryObjectStore::new();
        objects
            .put("b", &HashSetIndex::TYPE_ID.storage_key(), b"not an envelope".to_vec())
            .await
            .unwrap();
        let store = SnapshotIndexStore::new(objects);
        assert!(matches!(
            store.load::<HashSetIndex>("b").await.unwrap_err(),
            SnapshotError::Corrupt { .. }
        ));
    }

    #[tokio::test]
    async fn test_envelope_of_other_type_is_corrupt() {
        let objects = MemoryObjectStore::new();
        // Copy OtherIndex's snapshot to HashSetIndex's key.
        let writer = SnapshotIndexStore::new(objects.clone());
        writer.save(&OtherIndex { threshold: 9 }, "b").await.unwrap();
        let body = objects
            .get("b", &OtherIndex::TYPE_ID.storage_key())
            .await
            .unwrap()
            .unwrap();
        objects
            .put("b", &HashSetIndex::TYPE_ID.storage_key(), body)
            .await
            .unwrap();

        let err = writer.load::<HashSetIndex>("b").await.unwrap_err();
        assert!(matches!(err, SnapshotError::Corrupt { ref reason, .. } if reason.contains("OtherIndex")));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let store = SnapshotIndexStore::new(MemoryObjectStore::new());
        store.save(&sample(), "b").await.unwrap();
        let err = store.save(&Impostor { threshold: 1 }, "b").await.unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateType("tests.snapshot.HashSetIndex")));
        // The original snapshot is untouched.
        assert_eq!(store.load::<HashSetIndex>("b").await.unwrap(), sample());
        assert_eq!(store.registry().len(), 1);
    }
}
