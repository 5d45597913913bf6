// Path: crates/api/src/index/mod.rs

//! The `{save, load}` capability shared by every persisted match index.
//!
//! A match index is opaque to this workspace: it only has to be serializable and
//! to declare a stable [`IndexTypeId`]. The id, not the Rust type name, decides
//! the object key, so renaming or moving a type does not orphan its snapshots.

use async_trait::async_trait;
use hma_types::error::SnapshotError;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Object-key prefix under which every snapshot lives.
pub const INDEX_KEY_PREFIX: &str = "index/";
/// Object-key suffix of every snapshot.
pub const INDEX_KEY_SUFFIX: &str = ".index";

/// The stable, fully-qualified name of a concrete index implementation.
///
/// Third-party indexes should namespace their name (for example
/// `partner.integrity.indexers.CustomPdqIndex`) so they can share a bucket with
/// the built-in ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexTypeId(&'static str);

impl IndexTypeId {
    /// Declares a type id. Intended for use in `const` items.
    pub const fn new(fully_qualified_name: &'static str) -> Self {
        Self(fully_qualified_name)
    }

    /// The fully-qualified name.
    pub fn name(&self) -> &'static str {
        self.0
    }

    /// The deterministic object key: `index/{name}.index`.
    pub fn storage_key(&self) -> String {
        format!("{}{}{}", INDEX_KEY_PREFIX, self.0, INDEX_KEY_SUFFIX)
    }

    /// Checks the name is usable as a key component: non-empty, no path
    /// separators, only ASCII alphanumerics and `._-:`.
    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("index type name is empty".into());
        }
        if let Some(c) = self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ':')))
        {
            return Err(format!("index type name {:?} contains {:?}", self.0, c));
        }
        Ok(())
    }
}

impl fmt::Display for IndexTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A serializable match index with a stable storage identity.
pub trait SignalIndex: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The type's storage identity. Must be unique across all index types that
    /// share a bucket and must never change once snapshots exist.
    const TYPE_ID: IndexTypeId;
}

/// Persists and retrieves index snapshots, one per index type per bucket.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Serializes `index` and writes it under `I::TYPE_ID`'s key, replacing any
    /// previous snapshot of that type.
    async fn save<I: SignalIndex>(&self, index: &I, bucket: &str) -> Result<(), SnapshotError>;

    /// Reads and deserializes the snapshot of type `I`.
    async fn load<I: SignalIndex>(&self, bucket: &str) -> Result<I, SnapshotError>;
}
