//! Builders for updates, records and collaborations.

use hma_types::app::{
    Collaboration, CollaborationId, Cursor, IndicatorRecord, SignalType, Update, UpdateKind,
};
use hma_types::config::CollaborationConfig;
use std::collections::BTreeSet;

/// An update of `kind` at `position`.
pub fn update(
    kind: UpdateKind,
    indicator_id: &str,
    signal_type: SignalType,
    value: Option<&str>,
    position: u64,
) -> Update {
    Update {
        kind,
        indicator_id: indicator_id.to_string(),
        signal_type,
        value: value.map(str::to_string),
        tags: BTreeSet::new(),
        position: Cursor(position),
    }
}

/// A `VideoMd5` add.
pub fn add(indicator_id: &str, value: &str, position: u64) -> Update {
    update(UpdateKind::Add, indicator_id, SignalType::VideoMd5, Some(value), position)
}

pub fn typed_add(indicator_id: &str, signal_type: SignalType, value: &str, position: u64) -> Update {
    update(UpdateKind::Add, indicator_id, signal_type, Some(value), position)
}

/// A `VideoMd5` modification; `None` keeps the stored value.
pub fn modify(indicator_id: &str, value: Option<&str>, position: u64) -> Update {
    update(UpdateKind::Modify, indicator_id, SignalType::VideoMd5, value, position)
}

pub fn remove(indicator_id: &str, position: u64) -> Update {
    update(UpdateKind::Remove, indicator_id, SignalType::VideoMd5, None, position)
}

/// `count` consecutive `VideoMd5` adds at positions `first..first + count`.
pub fn adds(first: u64, count: u64) -> Vec<Update> {
    (first..first + count)
        .map(|p| add(&format!("ind-{}", p), &format!("{:032x}", p), p))
        .collect()
}

pub fn record(collaboration: u64, indicator_id: &str, signal_type: SignalType, value: &str) -> IndicatorRecord {
    IndicatorRecord {
        collaboration_id: CollaborationId(collaboration),
        indicator_id: indicator_id.to_string(),
        signal_type,
        value: value.to_string(),
        tags: BTreeSet::new(),
        position: Cursor::ORIGIN,
    }
}

pub fn md5_record(collaboration: u64, indicator_id: &str, value: &str) -> IndicatorRecord {
    record(collaboration, indicator_id, SignalType::VideoMd5, value)
}

/// A collaboration producing MD5 and PDQ signals.
pub fn collaboration(id: u64) -> Collaboration {
    Collaboration::new(id, format!("Collab {}", id), [SignalType::VideoMd5, SignalType::Pdq])
}

pub fn collaboration_config(id: &str, name: &str) -> CollaborationConfig {
    CollaborationConfig {
        privacy_group_id: id.to_string(),
        privacy_group_name: name.to_string(),
        signal_types: vec![SignalType::VideoMd5, SignalType::Pdq],
    }
}
