// Path: crates/storage/src/export.rs
//! Data files exported after every apply, read back by index builders.
//!
//! One object per (collaboration, signal type) at
//! `{data_folder}{collaboration_id}.{signal_type}.te`, holding one JSON-encoded
//! [`IndicatorRecord`] per line in indicator-id order.

use async_trait::async_trait;
use hma_api::indicators::{IndicatorStore, PostApply};
use hma_api::object::ObjectStore;
use hma_types::app::{Collaboration, CollaborationId, Delta, IndicatorRecord, SignalType};
use hma_types::error::StoreError;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DATA_FILE_EXTENSION: &str = ".te";

pub fn data_file_key(data_folder: &str, collaboration: CollaborationId, signal_type: SignalType) -> String {
    format!("{}{}.{}{}", data_folder, collaboration, signal_type, DATA_FILE_EXTENSION)
}

/// Inverse of [`data_file_key`]; `None` for keys outside `data_folder` or not
/// shaped like a data file.
pub fn parse_data_file_key(data_folder: &str, key: &str) -> Option<(CollaborationId, SignalType)> {
    let name = key.strip_prefix(data_folder)?.strip_suffix(DATA_FILE_EXTENSION)?;
    let (id, signal_type) = name.split_once('.')?;
    Some((CollaborationId(id.parse().ok()?), signal_type.parse().ok()?))
}

pub fn encode_data_file(records: &[IndicatorRecord]) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record).map_err(|e| StoreError::Encode(e.to_string()))?;
        out.push(b'\n');
    }
    Ok(out)
}

pub fn decode_data_file(body: &[u8]) -> Result<Vec<IndicatorRecord>, StoreError> {
    body.split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .map(|line| serde_json::from_slice(line).map_err(|e| StoreError::Decode(e.to_string())))
        .collect()
}

/// Rewrites a collaboration's data files from the local replica.
///
/// Files are rewritten whole for every signal type the collaboration declares
/// or the delta touched, limited to `signal_types`. A type whose last record
/// was removed still gets an (empty) file so the removal reaches readers.
pub struct DataFileExporter {
    indicators: Arc<dyn IndicatorStore>,
    objects: Arc<dyn ObjectStore>,
    bucket: String,
    data_folder: String,
    signal_types: BTreeSet<SignalType>,
}

impl DataFileExporter {
    pub fn new(
        indicators: Arc<dyn IndicatorStore>,
        objects: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        data_folder: impl Into<String>,
        signal_types: impl IntoIterator<Item = SignalType>,
    ) -> Self {
        Self {
            indicators,
            objects,
            bucket: bucket.into(),
            data_folder: data_folder.into(),
            signal_types: signal_types.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PostApply for DataFileExporter {
    async fn post_apply(&self, collaboration: &Collaboration, delta: &Delta) -> Result<(), StoreError> {
        let touched: BTreeSet<SignalType> = collaboration
            .signal_types
            .iter()
            .copied()
            .chain(delta.updates.iter().map(|u| u.signal_type))
            .filter(|t| self.signal_types.contains(t))
            .collect();
        if touched.is_empty() {
            return Ok(());
        }

        let records = self.indicators.records(collaboration.id).await?;
        for signal_type in touched {
            let rows: Vec<IndicatorRecord> = records
                .iter()
                .filter(|r| r.signal_type == signal_type)
                .cloned()
                .collect();
            let key = data_file_key(&self.data_folder, collaboration.id, signal_type);
            let body = encode_data_file(&rows)?;
            self.objects.put(&self.bucket, &key, body).await?;
            tracing::debug!(
                target: "fetcher",
                collaboration = %collaboration.id,
                key = %key,
                records = rows.len(),
                "exported data file"
            );
        }
        Ok(())
    }
}
