// Path: crates/api/src/metadata/mod.rs

//! The durable store holding one checkpoint row per (collaboration, app) pair.

use async_trait::async_trait;
use hma_types::app::{Checkpoint, CheckpointKey};
use hma_types::error::MetadataError;

/// A key-value store with strong read-after-write consistency per key.
///
/// `put` replaces the whole row in one write. The checkpoint manager relies on
/// this to make a reset all-or-nothing.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Reads the row for `key`, if one exists.
    async fn get(&self, key: &CheckpointKey) -> Result<Option<Checkpoint>, MetadataError>;

    /// Writes (creating or replacing) the row for `checkpoint.key`.
    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), MetadataError>;
}
