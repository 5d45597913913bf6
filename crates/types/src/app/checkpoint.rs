// Path: crates/types/src/app/checkpoint.rs
use crate::app::CollaborationId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a collaboration's remote feed.
///
/// Cursors are totally ordered; a later position never compares below an
/// earlier one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cursor(pub u64);

impl Cursor {
    /// The feed's defined origin. A reset moves a checkpoint back here.
    pub const ORIGIN: Cursor = Cursor(0);

    /// Returns true if this cursor is the feed origin.
    pub fn is_origin(&self) -> bool {
        *self == Self::ORIGIN
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The metadata-store key of a checkpoint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckpointKey {
    /// The collaboration being replicated.
    pub collaboration_id: CollaborationId,
    /// The remote application (API credential) doing the replicating.
    pub app_id: u64,
}

impl CheckpointKey {
    /// Creates a key for a (collaboration, app) pair.
    pub fn new(collaboration_id: CollaborationId, app_id: u64) -> Self {
        Self {
            collaboration_id,
            app_id,
        }
    }

    /// Big-endian byte encoding, suitable as an ordered storage key.
    pub fn to_key_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.collaboration_id.0.to_be_bytes());
        out[8..].copy_from_slice(&self.app_id.to_be_bytes());
        out
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collaboration_id, self.app_id)
    }
}

/// Durable record of how far a collaboration's local replica has been synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Which (collaboration, app) pair this row belongs to.
    pub key: CheckpointKey,
    /// The feed position the next fetch resumes from.
    pub cursor: Cursor,
    /// Set when the local replica can no longer be resumed incrementally.
    pub stale: bool,
    /// Unix seconds; no fetch happens for this collaboration until this has passed.
    pub next_fetch_after: u64,
    /// Unix seconds of the last successful advance, if there has been one.
    pub last_advanced_at: Option<u64>,
    /// Unix seconds when this row was (re)created.
    pub created_at: u64,
}

impl Checkpoint {
    /// A fresh checkpoint positioned at the feed origin.
    pub fn at_origin(key: CheckpointKey, now: u64) -> Self {
        Self {
            key,
            cursor: Cursor::ORIGIN,
            stale: false,
            next_fetch_after: 0,
            last_advanced_at: None,
            created_at: now,
        }
    }

    /// Seconds since the last successful advance (or since creation when the
    /// checkpoint has never advanced).
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_advanced_at.unwrap_or(self.created_at))
    }
}
