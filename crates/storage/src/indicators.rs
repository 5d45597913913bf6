// Path: crates/storage/src/indicators.rs
//! `IndicatorStore` backends holding the local replica of the feed.

use async_trait::async_trait;
use hma_api::indicators::IndicatorStore;
use hma_types::app::{CollaborationId, IndicatorRecord, Update, UpdateKind};
use hma_types::codec;
use hma_types::error::StoreError;
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// key = [collaboration_id_be(8)][indicator_id utf8], value = bincode `IndicatorRecord`
const INDICATORS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("INDICATORS");

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn k_indicator(collaboration: CollaborationId, indicator_id: &str) -> Vec<u8> {
    [
        collaboration.0.to_be_bytes().as_slice(),
        indicator_id.as_bytes(),
    ]
    .concat()
}

/// Folds one update into the currently stored record.
///
/// Returns `None` when the record should not exist afterwards. A `Modify`
/// without a value keeps the stored value and only replaces tags; an `Add`
/// without a value has nothing to store and leaves the record as it was.
pub(crate) fn fold_update(
    existing: Option<IndicatorRecord>,
    collaboration: CollaborationId,
    update: &Update,
) -> Option<IndicatorRecord> {
    match (update.kind, &update.value, existing) {
        (UpdateKind::Remove, _, _) => None,
        (_, Some(value), _) => Some(IndicatorRecord {
            collaboration_id: collaboration,
            indicator_id: update.indicator_id.clone(),
            signal_type: update.signal_type,
            value: value.clone(),
            tags: update.tags.clone(),
            position: update.position,
        }),
        (UpdateKind::Modify, None, Some(mut record)) => {
            record.tags = update.tags.clone();
            record.position = update.position;
            Some(record)
        }
        (_, None, existing) => {
            tracing::warn!(
                target: "indicators",
                collaboration = %collaboration,
                indicator_id = %update.indicator_id,
                kind = ?update.kind,
                "update carries no value; leaving record unchanged"
            );
            existing
        }
    }
}

/// The local replica persisted in a redb database.
#[derive(Clone)]
pub struct RedbIndicatorStore {
    db: Arc<Database>,
}

impl RedbIndicatorStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(backend)?;
        {
            let w = db.begin_write().map_err(backend)?;
            w.open_table(INDICATORS).map_err(backend)?;
            w.commit().map_err(backend)?;
        }
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl IndicatorStore for RedbIndicatorStore {
    async fn apply_batch(
        &self,
        collaboration: CollaborationId,
        updates: &[Update],
    ) -> Result<(), StoreError> {
        let db = self.db.clone();
        let updates = updates.to_vec();
        tokio::task::spawn_blocking(move || {
            let w = db.begin_write().map_err(backend)?;
            {
                let mut t = w.open_table(INDICATORS).map_err(backend)?;
                for update in &updates {
                    let key = k_indicator(collaboration, &update.indicator_id);
                    let existing = match t.get(key.as_slice()).map_err(backend)? {
                        Some(raw) => Some(
                            codec::from_bytes::<IndicatorRecord>(raw.value())
                                .map_err(StoreError::Decode)?,
                        ),
                        None => None,
                    };
                    match fold_update(existing, collaboration, update) {
                        Some(record) => {
                            let bytes = codec::to_bytes(&record).map_err(StoreError::Encode)?;
                            t.insert(key.as_slice(), bytes.as_slice()).map_err(backend)?;
                        }
                        None => {
                            t.remove(key.as_slice()).map_err(backend)?;
                        }
                    }
                }
            }
            // Dropping an uncommitted write transaction aborts it, so an error
            // above leaves no part of the batch behind.
            w.commit().map_err(backend)
        })
        .await
        .map_err(backend)?
    }

    async fn get(
        &self,
        collaboration: CollaborationId,
        indicator_id: &str,
    ) -> Result<Option<IndicatorRecord>, StoreError> {
        let db = self.db.clone();
        let key = k_indicator(collaboration, indicator_id);
        tokio::task::spawn_blocking(move || {
            let r = db.begin_read().map_err(backend)?;
            let t = r.open_table(INDICATORS).map_err(backend)?;
            let Some(raw) = t.get(key.as_slice()).map_err(backend)? else {
                return Ok(None);
            };
            codec::from_bytes(raw.value())
                .map(Some)
                .map_err(StoreError::Decode)
        })
        .await
        .map_err(backend)?
    }

    async fn records(
        &self,
        collaboration: CollaborationId,
    ) -> Result<Vec<IndicatorRecord>, StoreError> {
        let db = self.db.clone();
        let prefix = collaboration.0.to_be_bytes();
        tokio::task::spawn_blocking(move || {
            let r = db.begin_read().map_err(backend)?;
            let t = r.open_table(INDICATORS).map_err(backend)?;
            let mut out = Vec::new();
            for entry in t.range(prefix.as_slice()..).map_err(backend)? {
                let (k, v) = entry.map_err(backend)?;
                if !k.value().starts_with(&prefix) {
                    break;
                }
                out.push(codec::from_bytes(v.value()).map_err(StoreError::Decode)?);
            }
            Ok(out)
        })
        .await
        .map_err(backend)?
    }

    async fn clear(&self, collaboration: CollaborationId) -> Result<(), StoreError> {
        let db = self.db.clone();
        let prefix = collaboration.0.to_be_bytes();
        tokio::task::spawn_blocking(move || {
            let w = db.begin_write().map_err(backend)?;
            let removed = {
                let mut t = w.open_table(INDICATORS).map_err(backend)?;
                let mut keys = Vec::new();
                for entry in t.range(prefix.as_slice()..).map_err(backend)? {
                    let (k, _) = entry.map_err(backend)?;
                    if !k.value().starts_with(&prefix) {
                        break;
                    }
                    keys.push(k.value().to_vec());
                }
                for key in &keys {
                    t.remove(key.as_slice()).map_err(backend)?;
                }
                keys.len()
            };
            w.commit().map_err(backend)?;
            tracing::info!(target: "indicators", collaboration = %collaboration, removed, "cleared replica");
            Ok(())
        })
        .await
        .map_err(backend)?
    }
}

/// In-memory replica for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndicatorStore {
    // (collaboration, indicator_id) -> record
    records: Arc<RwLock<BTreeMap<(CollaborationId, String), IndicatorRecord>>>,
}

impl MemoryIndicatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything stored, for comparing whole-store states in tests.
    pub fn snapshot(&self) -> BTreeMap<(CollaborationId, String), IndicatorRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("indicator map lock poisoned".into())
}

#[async_trait]
impl IndicatorStore for MemoryIndicatorStore {
    async fn apply_batch(
        &self,
        collaboration: CollaborationId,
        updates: &[Update],
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        for update in updates {
            let key = (collaboration, update.indicator_id.clone());
            let existing = records.remove(&key);
            if let Some(record) = fold_update(existing, collaboration, update) {
                records.insert(key, record);
            }
        }
        Ok(())
    }

    async fn get(
        &self,
        collaboration: CollaborationId,
        indicator_id: &str,
    ) -> Result<Option<IndicatorRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .get(&(collaboration, indicator_id.to_string()))
            .cloned())
    }

    async fn records(
        &self,
        collaboration: CollaborationId,
    ) -> Result<Vec<IndicatorRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .iter()
            .filter(|((c, _), _)| *c == collaboration)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn clear(&self, collaboration: CollaborationId) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.retain(|(c, _), _| *c != collaboration);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hma_test_utils::fixtures::{add, modify, remove};
    use tempfile::tempdir;

    const C1: CollaborationId = CollaborationId(1);
    const C2: CollaborationId = CollaborationId(2);

    #[tokio::test]
    async fn test_last_write_wins_within_batch() {
        let dir = tempdir().unwrap();
        let store = RedbIndicatorStore::open(dir.path().join("indicators.redb")).unwrap();

        let batch = vec![
            add("100", "aa", 1),
            add("200", "bb", 2),
            modify("100", Some("cc"), 3),
            remove("200", 4),
        ];
        store.apply_batch(C1, &batch).await.unwrap();

        let rec = store.get(C1, "100").await.unwrap().unwrap();
        assert_eq!(rec.value, "cc");
        assert_eq!(rec.position.0, 3);
        assert_eq!(store.get(C1, "200").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_collaborations_are_partitioned() {
        let dir = tempdir().unwrap();
        let store = RedbIndicatorStore::open(dir.path().join("indicators.redb")).unwrap();
        store.apply_batch(C1, &[add("1", "aa", 1)]).await.unwrap();
        store
            .apply_batch(C2, &[add("1", "bb", 1), add("2", "cc", 2)])
            .await
            .unwrap();

        assert_eq!(store.records(C1).await.unwrap().len(), 1);
        let c2 = store.records(C2).await.unwrap();
        assert_eq!(c2.len(), 2);
        assert!(c2.iter().all(|r| r.collaboration_id == C2));
    }

    #[tokio::test]
    async fn test_clear_drops_one_collaboration() {
        let dir = tempdir().unwrap();
        let store = RedbIndicatorStore::open(dir.path().join("indicators.redb")).unwrap();
        store
            .apply_batch(C1, &[add("1", "aa", 1), add("2", "bb", 2)])
            .await
            .unwrap();
        store.apply_batch(C2, &[add("1", "cc", 1)]).await.unwrap();

        store.clear(C1).await.unwrap();
        assert!(store.records(C1).await.unwrap().is_empty());
        assert_eq!(store.records(C2).await.unwrap().len(), 1);

        // Clearing an empty collaboration is a no-op.
        store.clear(C1).await.unwrap();

        let memory = MemoryIndicatorStore::new();
        memory.apply_batch(C1, &[add("1", "aa", 1)]).await.unwrap();
        memory.apply_batch(C2, &[add("1", "cc", 1)]).await.unwrap();
        memory.clear(C1).await.unwrap();
        assert_eq!(memory.get(C1, "1").await.unwrap(), None);
        assert!(memory.get(C2, "1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_modify_without_value_keeps_value() {
        let store = MemoryIndicatorStore::new();
        store.apply_batch(C1, &[add("1", "aa", 1)]).await.unwrap();
        let mut m = modify("1", None, 2);
        m.tags.insert("reviewed".into());
        store.apply_batch(C1, &[m]).await.unwrap();

        let rec = store.get(C1, "1").await.unwrap().unwrap();
        assert_eq!(rec.value, "aa");
        assert!(rec.tags.contains("reviewed"));
    }

    #[tokio::test]
    async fn test_replay_converges() {
        let store = MemoryIndicatorStore::new();
        let batch = vec![add("1", "aa", 1), modify("1", Some("bb"), 2), add("2", "cc", 3)];
        store.apply_batch(C1, &batch).await.unwrap();
        let once = store.snapshot();
        store.apply_batch(C1, &batch).await.unwrap();
        assert_eq!(store.snapshot(), once);
    }
}
