// Path: crates/fetcher/src/checkpoint.rs
//! Loading, resetting and advancing per-collaboration checkpoints.

use hma_api::metadata::CheckpointStore;
use hma_types::app::{Checkpoint, CheckpointKey, Collaboration, Delta};
use hma_types::error::CheckpointError;
use std::sync::Arc;

/// Owns the checkpoint rows of one remote app.
///
/// Every write is a single whole-row `put`, so a reset either replaces the row
/// entirely or leaves it untouched.
pub struct CheckpointManager<M: ?Sized> {
    store: Arc<M>,
    app_id: u64,
    staleness_threshold_secs: u64,
    fetch_interval_secs: u64,
}

impl<M: CheckpointStore + ?Sized> CheckpointManager<M> {
    pub fn new(
        store: Arc<M>,
        app_id: u64,
        staleness_threshold_secs: u64,
        fetch_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            app_id,
            staleness_threshold_secs,
            fetch_interval_secs,
        }
    }

    pub fn key(&self, collaboration: &Collaboration) -> CheckpointKey {
        CheckpointKey::new(collaboration.id, self.app_id)
    }

    /// Reads the checkpoint, creating and persisting one at the origin if the
    /// collaboration has never been synced.
    pub async fn load(
        &self,
        collaboration: &Collaboration,
        now: u64,
    ) -> Result<Checkpoint, CheckpointError> {
        let key = self.key(collaboration);
        if let Some(checkpoint) = self.store.get(&key).await? {
            return Ok(checkpoint);
        }
        let checkpoint = Checkpoint::at_origin(key, now);
        self.store.put(&checkpoint).await?;
        tracing::info!(target: "checkpoint", key = %key, "created checkpoint at origin");
        Ok(checkpoint)
    }

    /// True if the stale flag is set or the checkpoint has not advanced for
    /// longer than the staleness threshold.
    pub fn is_stale(&self, checkpoint: &Checkpoint, now: u64) -> bool {
        checkpoint.stale || checkpoint.age(now) > self.staleness_threshold_secs
    }

    /// Replaces the row with a fresh one at the origin. The local replica is
    /// then rebuilt from the start of the feed.
    pub async fn reset(
        &self,
        collaboration: &Collaboration,
        now: u64,
    ) -> Result<Checkpoint, CheckpointError> {
        let checkpoint = Checkpoint::at_origin(self.key(collaboration), now);
        self.store.put(&checkpoint).await?;
        Ok(checkpoint)
    }

    pub fn due(&self, checkpoint: &Checkpoint, now: u64) -> bool {
        checkpoint.next_fetch_after < now
    }

    /// Moves the cursor to `delta.end` and schedules the next fetch.
    ///
    /// Rejects deltas that never finished and any end before the stored
    /// cursor. An end equal to the stored cursor (nothing new was read) only
    /// refreshes the timestamps.
    pub async fn advance(
        &self,
        collaboration: &Collaboration,
        delta: &Delta,
        now: u64,
    ) -> Result<Checkpoint, CheckpointError> {
        let key = self.key(collaboration);
        let end = delta.end.ok_or(CheckpointError::UnfinishedDelta(key))?;
        let mut checkpoint = self.load(collaboration, now).await?;
        if end < checkpoint.cursor {
            return Err(CheckpointError::Regression {
                key,
                current: checkpoint.cursor,
                proposed: end,
            });
        }
        checkpoint.cursor = end;
        checkpoint.last_advanced_at = Some(now);
        checkpoint.next_fetch_after = now.saturating_add(self.fetch_interval_secs);
        self.store.put(&checkpoint).await?;
        tracing::debug!(
            target: "checkpoint",
            key = %key,
            cursor = %end,
            next_fetch_after = checkpoint.next_fetch_after,
            "advanced checkpoint"
        );
        Ok(checkpoint)
    }

    /// Flags the checkpoint so the next cycle resets it.
    pub async fn mark_stale(
        &self,
        collaboration: &Collaboration,
        now: u64,
    ) -> Result<Checkpoint, CheckpointError> {
        let mut checkpoint = self.load(collaboration, now).await?;
        checkpoint.stale = true;
        self.store.put(&checkpoint).await?;
        tracing::warn!(target: "checkpoint", key = %checkpoint.key, "checkpoint marked stale");
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hma_test_utils::fixtures::{adds, collaboration};
    use hma_test_utils::stores::RecordingCheckpointStore;
    use hma_types::app::Cursor;
    use hma_types::error::MetadataError;

    const DAY: u64 = 24 * 60 * 60;

    fn manager(store: &Arc<RecordingCheckpointStore>) -> CheckpointManager<RecordingCheckpointStore> {
        CheckpointManager::new(store.clone(), 77, 90 * DAY, 60)
    }

    fn finished(begin: u64, updates: u64) -> Delta {
        let c = collaboration(1);
        let mut delta = Delta::new(c.id, Cursor(begin));
        delta.extend_page(adds(begin + 1, updates), Cursor(begin + updates), true);
        delta.finish();
        delta
    }

    #[tokio::test]
    async fn test_load_creates_once() {
        let store = Arc::new(RecordingCheckpointStore::new());
        let m = manager(&store);
        let c = collaboration(1);

        let first = m.load(&c, 1_000).await.unwrap();
        assert_eq!(first.cursor, Cursor::ORIGIN);
        assert_eq!(first.key.app_id, 77);
        let again = m.load(&c, 2_000).await.unwrap();
        assert_eq!(again, first);
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_staleness_threshold() {
        let store = Arc::new(RecordingCheckpointStore::new());
        let m = manager(&store);
        let c = collaboration(1);
        let cp = m.advance(&c, &finished(0, 3), 10 * DAY).await.unwrap();

        assert!(!m.is_stale(&cp, 100 * DAY));
        assert!(m.is_stale(&cp, 100 * DAY + 1));

        let flagged = m.mark_stale(&c, 11 * DAY).await.unwrap();
        assert!(m.is_stale(&flagged, 11 * DAY));
    }

    #[tokio::test]
    async fn test_reset_replaces_row() {
        let store = Arc::new(RecordingCheckpointStore::new());
        let m = manager(&store);
        let c = collaboration(1);
        m.advance(&c, &finished(0, 5), 100).await.unwrap();
        m.mark_stale(&c, 200).await.unwrap();

        let fresh = m.reset(&c, 300).await.unwrap();
        assert_eq!(fresh.cursor, Cursor::ORIGIN);
        assert!(!fresh.stale);
        assert_eq!(fresh.next_fetch_after, 0);
        assert_eq!(fresh.last_advanced_at, None);
        assert_eq!(store.current(&m.key(&c)), Some(fresh));
    }

    #[tokio::test]
    async fn test_failed_reset_changes_nothing() {
        let store = Arc::new(RecordingCheckpointStore::new());
        let m = manager(&store);
        let c = collaboration(1);
        let before = m.advance(&c, &finished(0, 5), 100).await.unwrap();

        store.set_unavailable(false, true);
        let err = m.reset(&c, 300).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Metadata(MetadataError::Unavailable(_))));
        assert_eq!(store.current(&m.key(&c)), Some(before));
    }

    #[tokio::test]
    async fn test_advance_schedules_next_fetch() {
        let store = Arc::new(RecordingCheckpointStore::new());
        let m = manager(&store);
        let c = collaboration(1);

        let cp = m.advance(&c, &finished(0, 4), 1_000).await.unwrap();
        assert_eq!(cp.cursor, Cursor(4));
        assert_eq!(cp.last_advanced_at, Some(1_000));
        assert_eq!(cp.next_fetch_after, 1_060);
        assert!(!m.due(&cp, 1_060));
        assert!(m.due(&cp, 1_061));
    }

    #[tokio::test]
    async fn test_advance_rejects_regression_and_unfinished() {
        let store = Arc::new(RecordingCheckpointStore::new());
        let m = manager(&store);
        let c = collaboration(1);
        m.advance(&c, &finished(0, 10), 100).await.unwrap();

        let err = m.advance(&c, &finished(0, 3), 200).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Regression { current, proposed, .. }
            if current == Cursor(10) && proposed == Cursor(3)));

        let open = Delta::new(c.id, Cursor(10));
        assert!(matches!(
            m.advance(&c, &open, 200).await.unwrap_err(),
            CheckpointError::UnfinishedDelta(_)
        ));
        assert_eq!(store.current(&m.key(&c)).unwrap().cursor, Cursor(10));
    }
}
