// Path: crates/storage/src/index.rs
//! The built-in exact-match index over MD5 signals.

use hma_api::index::{IndexTypeId, SignalIndex};
use hma_types::app::{CollaborationId, IndicatorRecord, SignalType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a matching hash came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexEntry {
    pub collaboration_id: CollaborationId,
    pub indicator_id: String,
    pub signal_type: SignalType,
}

/// Maps lowercase hex MD5 digests to the indicators that carry them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Md5ExactIndex {
    entries: BTreeMap<String, Vec<IndexEntry>>,
}

impl SignalIndex for Md5ExactIndex {
    const TYPE_ID: IndexTypeId = IndexTypeId::new("hma.storage.index.Md5ExactIndex");
}

impl Md5ExactIndex {
    /// Whether records of `signal_type` belong in this index.
    pub fn accepts(signal_type: SignalType) -> bool {
        matches!(signal_type, SignalType::VideoMd5 | SignalType::PhotoMd5)
    }

    /// Builds the index from replica records, ignoring non-MD5 signal types.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a IndicatorRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            if Self::accepts(record.signal_type) {
                index.insert(record);
            }
        }
        index
    }

    fn insert(&mut self, record: &IndicatorRecord) {
        let entry = IndexEntry {
            collaboration_id: record.collaboration_id,
            indicator_id: record.indicator_id.clone(),
            signal_type: record.signal_type,
        };
        let bucket = self
            .entries
            .entry(record.value.trim().to_ascii_lowercase())
            .or_default();
        if let Err(pos) = bucket.binary_search(&entry) {
            bucket.insert(pos, entry);
        }
    }

    /// All indicators whose digest equals `hash`, case-insensitively.
    pub fn query(&self, hash: &str) -> &[IndexEntry] {
        self.entries
            .get(&hash.trim().to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct digests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
