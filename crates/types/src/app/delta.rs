// Path: crates/types/src/app/delta.rs
use crate::app::{CollaborationId, Cursor, SignalType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What an update does to the indicator it is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// A previously unseen indicator.
    Add,
    /// A change to an existing indicator (new tags, new value).
    Modify,
    /// The indicator was deleted upstream or left the collaboration.
    Remove,
}

/// One indicator mutation read from the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// The mutation applied to the indicator.
    pub kind: UpdateKind,
    /// The feed-assigned identifier that keys the indicator.
    pub indicator_id: String,
    /// The type of the signal payload.
    pub signal_type: SignalType,
    /// The hash or content payload; absent for removals.
    #[serde(default)]
    pub value: Option<String>,
    /// Free-form labels attached upstream.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// The feed position immediately after this update.
    pub position: Cursor,
}

/// The stored form of an indicator in the local replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// The collaboration the indicator was replicated from.
    pub collaboration_id: CollaborationId,
    /// The feed-assigned identifier.
    pub indicator_id: String,
    /// The type of the signal payload.
    pub signal_type: SignalType,
    /// The hash or content payload.
    pub value: String,
    /// Free-form labels attached upstream.
    pub tags: BTreeSet<String>,
    /// The feed position of the update that last wrote this record.
    pub position: Cursor,
}

/// One fetch cycle's worth of updates for a single collaboration.
///
/// `current` always names the position right after the last fully consumed
/// update. `end` stays `None` while the cycle is running and is set exactly
/// once, either by [`Delta::finish`] or, after a mid-stream failure, by
/// [`Delta::truncate`]. Both pin `end` to `current`, so whatever was read is
/// applied and the next cycle resumes right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// The collaboration this delta was fetched for.
    pub collaboration_id: CollaborationId,
    /// The cursor the fetch started from.
    pub begin: Cursor,
    /// The position after the last fully consumed update.
    pub current: Cursor,
    /// The position the checkpoint advances to once this delta is applied.
    pub end: Option<Cursor>,
    /// The updates, in feed order.
    pub updates: Vec<Update>,
    /// Whether the fetch caught up with the feed's live edge.
    pub reached_live_edge: bool,
}

impl Delta {
    /// Starts an empty delta at `begin`.
    pub fn new(collaboration_id: CollaborationId, begin: Cursor) -> Self {
        Self {
            collaboration_id,
            begin,
            current: begin,
            end: None,
            updates: Vec::new(),
            reached_live_edge: false,
        }
    }

    /// Appends a fully consumed page and moves `current` to `next`.
    ///
    /// A page cursor that would move `current` backwards is ignored; positions
    /// carried by the updates themselves still count.
    pub fn extend_page(&mut self, updates: Vec<Update>, next: Cursor, reached_live_edge: bool) {
        for update in updates {
            self.push(update);
        }
        self.current = self.current.max(next);
        self.reached_live_edge = reached_live_edge;
    }

    /// Appends a single consumed update.
    pub fn push(&mut self, update: Update) {
        self.current = self.current.max(update.position);
        self.updates.push(update);
    }

    /// Marks the cycle as complete.
    pub fn finish(&mut self) {
        self.end = Some(self.current);
    }

    /// Forces the delta to show finished at the last consumed position after a
    /// failure, so the partial batch can still be applied.
    pub fn truncate(&mut self) {
        self.end = Some(self.current);
    }

    /// True if nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// The number of updates retrieved.
    pub fn len(&self) -> usize {
        self.updates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: &str, pos: u64) -> Update {
        Update {
            kind: UpdateKind::Add,
            indicator_id: id.to_string(),
            signal_type: SignalType::Pdq,
            value: Some("ab".repeat(32)),
            tags: BTreeSet::new(),
            position: Cursor(pos),
        }
    }

    #[test]
    fn test_extend_page_tracks_current() {
        let mut d = Delta::new(CollaborationId(1), Cursor(10));
        d.extend_page(vec![update("a", 11), update("b", 12)], Cursor(15), false);
        assert_eq!(d.current, Cursor(15));
        assert_eq!(d.end, None);
        d.finish();
        assert_eq!(d.end, Some(Cursor(15)));
    }

    #[test]
    fn test_page_cursor_never_moves_backwards() {
        let mut d = Delta::new(CollaborationId(1), Cursor(10));
        d.extend_page(vec![update("a", 20)], Cursor(5), true);
        assert_eq!(d.current, Cursor(20));
        assert!(d.reached_live_edge);
    }

    #[test]
    fn test_truncate_pins_end_to_last_consumed_position() {
        let mut d = Delta::new(CollaborationId(1), Cursor(0));
        d.push(update("a", 3));
        d.truncate();
        assert_eq!(d.end, Some(Cursor(3)));
        assert_eq!(d.len(), 1);
    }
}
