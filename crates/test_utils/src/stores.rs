// Path: crates/test_utils/src/stores.rs
//! Store doubles with failure switches.

use async_trait::async_trait;
use hma_api::indicators::IndicatorStore;
use hma_api::metadata::CheckpointStore;
use hma_types::app::{Checkpoint, CheckpointKey, CollaborationId, IndicatorRecord, Update};
use hma_types::error::{MetadataError, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory checkpoint store that keeps every row ever written.
#[derive(Debug, Default)]
pub struct RecordingCheckpointStore {
    rows: Mutex<HashMap<CheckpointKey, Checkpoint>>,
    history: Mutex<Vec<Checkpoint>>,
    fail_get: AtomicBool,
    fail_put: AtomicBool,
}

impl RecordingCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row without recording it in the history.
    pub fn seed(&self, checkpoint: Checkpoint) {
        self.rows
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(checkpoint.key, checkpoint);
    }

    pub fn set_unavailable(&self, get: bool, put: bool) {
        self.fail_get.store(get, Ordering::SeqCst);
        self.fail_put.store(put, Ordering::SeqCst);
    }

    /// Every successful `put`, in order.
    pub fn history(&self) -> Vec<Checkpoint> {
        self.history.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn history_for(&self, key: &CheckpointKey) -> Vec<Checkpoint> {
        self.history().into_iter().filter(|c| c.key == *key).collect()
    }

    pub fn current(&self, key: &CheckpointKey) -> Option<Checkpoint> {
        self.rows
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl CheckpointStore for RecordingCheckpointStore {
    async fn get(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>, MetadataError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(MetadataError::Unavailable("metadata store is down".into()));
        }
        Ok(self.current(key))
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), MetadataError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(MetadataError::Unavailable("metadata store is down".into()));
        }
        self.seed(checkpoint.clone());
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(checkpoint.clone());
        Ok(())
    }
}

/// An indicator store whose writes always fail and whose reads see nothing.
#[derive(Debug, Default)]
pub struct FailingIndicatorStore;

#[async_trait]
impl IndicatorStore for FailingIndicatorStore {
    async fn apply_batch(&self, _: CollaborationId, _: &[Update]) -> Result<(), StoreError> {
        Err(StoreError::Backend("local store is read-only".into()))
    }

    async fn get(&self, _: CollaborationId, _: &str) -> Result<Option<IndicatorRecord>, StoreError> {
        Ok(None)
    }

    async fn records(&self, _: CollaborationId) -> Result<Vec<IndicatorRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn clear(&self, _: CollaborationId) -> Result<(), StoreError> {
        Err(StoreError::Backend("local store is read-only".into()))
    }
}
