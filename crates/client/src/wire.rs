// Path: crates/client/src/wire.rs
//! JSON shapes of the `threat_updates` endpoint.
//!
//! ```text
//! GET {base_url}/{collaboration_id}/threat_updates?start={cursor}&limit={n}
//! Authorization: OAuth {token}
//!
//! 200 {"data": [ThreatUpdate...], "next": <cursor>, "live": <bool>}
//! ```
//!
//! `start` is exclusive. Every update carries the feed position right after
//! it; `next` is where the following page starts.

use hma_types::app::{Cursor, SignalType, Update, UpdateKind};
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, Deserialize)]
pub(crate) struct UpdatesResponse {
    #[serde(default)]
    pub data: Vec<ThreatUpdate>,
    pub next: u64,
    #[serde(default)]
    pub live: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThreatUpdate {
    pub id: String,
    #[serde(default)]
    pub indicator: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: u64,
    #[serde(default)]
    pub should_delete: bool,
    /// Set when the indicator was already known to the feed before this update.
    #[serde(default)]
    pub modified: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Maps the feed's indicator type names onto ours.
pub(crate) fn signal_type(name: &str) -> Option<SignalType> {
    match name {
        "HASH_PDQ" => Some(SignalType::Pdq),
        "HASH_VIDEO_MD5" => Some(SignalType::VideoMd5),
        "HASH_MD5" => Some(SignalType::PhotoMd5),
        "URI" => Some(SignalType::Url),
        _ => None,
    }
}

impl ThreatUpdate {
    /// `None` for indicator types this workspace has no signal type for.
    pub(crate) fn into_update(self) -> Option<Update> {
        let signal_type = signal_type(&self.kind)?;
        let kind = if self.should_delete {
            UpdateKind::Remove
        } else if self.modified {
            UpdateKind::Modify
        } else {
            UpdateKind::Add
        };
        Some(Update {
            kind,
            indicator_id: self.id,
            signal_type,
            value: if self.should_delete { None } else { self.indicator },
            tags: self.tags,
            position: Cursor(self.position),
        })
    }
}
