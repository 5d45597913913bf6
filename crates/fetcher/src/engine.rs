// Path: crates/fetcher/src/engine.rs
//! Fetching a delta from the feed and applying it to the local replica.

use hma_api::feed::FeedClient;
use hma_api::indicators::{IndicatorStore, PostApply};
use hma_types::app::{Checkpoint, Collaboration, Delta, SignalType, Update};
use hma_types::error::{FeedError, SyncError};
use std::collections::BTreeSet;

/// The result of paging through the feed.
///
/// The delta is always present and always finished. When paging failed part
/// way, the delta ends at the last consumed update and `error` says why.
#[derive(Debug)]
pub struct FetchOutcome {
    pub delta: Delta,
    pub error: Option<FeedError>,
}

/// What an apply wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Updates written to the local store.
    pub applied: usize,
    /// Updates dropped because their signal type is not supported locally.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct DeltaEngine {
    page_size: usize,
    batch_budget: usize,
    supported: BTreeSet<SignalType>,
}

impl DeltaEngine {
    pub fn new(
        page_size: usize,
        batch_budget: usize,
        supported: impl IntoIterator<Item = SignalType>,
    ) -> Self {
        Self {
            page_size: page_size.max(1),
            batch_budget,
            supported: supported.into_iter().collect(),
        }
    }

    /// Reads updates after `checkpoint.cursor` until the live edge or the batch
    /// budget, whichever comes first.
    pub async fn fetch<F: FeedClient + ?Sized>(
        &self,
        collaboration: &Collaboration,
        checkpoint: &Checkpoint,
        feed: &F,
    ) -> FetchOutcome {
        let mut delta = Delta::new(collaboration.id, checkpoint.cursor);
        loop {
            let remaining = self.batch_budget.saturating_sub(delta.len());
            if remaining == 0 {
                tracing::info!(
                    target: "fetcher",
                    collaboration = %collaboration.id,
                    budget = self.batch_budget,
                    "batch budget reached; remaining updates wait for the next run"
                );
                break;
            }
            let limit = self.page_size.min(remaining);
            let page = match feed
                .fetch_incremental(collaboration, delta.current, limit)
                .await
            {
                Ok(page) => page,
                Err(error) => {
                    delta.truncate();
                    return FetchOutcome {
                        delta,
                        error: Some(error),
                    };
                }
            };

            let received = page.updates.len();
            if received > limit {
                // An oversized page is consumed only up to the budget; `current`
                // then follows the last consumed update, not the page cursor.
                for update in page.updates.into_iter().take(limit) {
                    delta.push(update);
                }
                continue;
            }
            let made_progress = received > 0 || page.next_cursor > delta.current;
            delta.extend_page(page.updates, page.next_cursor, page.reached_live_edge);
            if page.reached_live_edge {
                break;
            }
            if !made_progress {
                tracing::warn!(
                    target: "fetcher",
                    collaboration = %collaboration.id,
                    cursor = %delta.current,
                    "feed returned an empty page short of the live edge; stopping"
                );
                break;
            }
        }
        delta.finish();
        FetchOutcome { delta, error: None }
    }

    /// Writes the delta's supported updates in order, then runs `post_apply`
    /// exactly once.
    ///
    /// An empty delta writes nothing and skips the hook.
    pub async fn apply<S, P>(
        &self,
        collaboration: &Collaboration,
        delta: &Delta,
        store: &S,
        post_apply: &P,
    ) -> Result<ApplyReport, SyncError>
    where
        S: IndicatorStore + ?Sized,
        P: PostApply + ?Sized,
    {
        if delta.is_empty() {
            return Ok(ApplyReport::default());
        }
        let (kept, dropped): (Vec<&Update>, Vec<&Update>) = delta
            .updates
            .iter()
            .partition(|u| self.supported.contains(&u.signal_type));
        if !dropped.is_empty() {
            tracing::debug!(
                target: "fetcher",
                collaboration = %collaboration.id,
                skipped = dropped.len(),
                "skipping updates of unsupported signal types"
            );
        }
        let applied = kept.len();
        if !kept.is_empty() {
            let batch: Vec<Update> = kept.into_iter().cloned().collect();
            store
                .apply_batch(collaboration.id, &batch)
                .await
                .map_err(SyncError::Apply)?;
        }
        post_apply
            .post_apply(collaboration, delta)
            .await
            .map_err(SyncError::PostApply)?;
        Ok(ApplyReport {
            applied,
            skipped: dropped.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hma_storage::MemoryIndicatorStore;
    use hma_test_utils::feed::ScriptedFeedClient;
    use hma_test_utils::fixtures::{adds, collaboration, typed_add};
    use hma_test_utils::hooks::RecordingPostApply;
    use hma_types::app::{CheckpointKey, Cursor};

    fn checkpoint_at(c: &Collaboration, cursor: u64) -> Checkpoint {
        let mut cp = Checkpoint::at_origin(CheckpointKey::new(c.id, 1), 0);
        cp.cursor = Cursor(cursor);
        cp
    }

    #[tokio::test]
    async fn test_fetch_pages_to_live_edge() {
        let c = collaboration(1);
        let feed = ScriptedFeedClient::new(1).with_updates(c.id, adds(1, 25));
        let engine = DeltaEngine::new(10, 1_000, SignalType::ALL);

        let out = engine.fetch(&c, &checkpoint_at(&c, 0), &feed).await;
        assert!(out.error.is_none());
        assert_eq!(out.delta.len(), 25);
        assert_eq!(out.delta.end, Some(Cursor(25)));
        assert!(out.delta.reached_live_edge);
        let resumes: Vec<u64> = feed.calls().iter().map(|c| c.resume.0).collect();
        assert_eq!(resumes, vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn test_fetch_resumes_after_checkpoint() {
        let c = collaboration(1);
        let feed = ScriptedFeedClient::new(1).with_updates(c.id, adds(1, 8));
        let engine = DeltaEngine::new(100, 1_000, SignalType::ALL);

        let out = engine.fetch(&c, &checkpoint_at(&c, 5), &feed).await;
        assert_eq!(out.delta.begin, Cursor(5));
        assert_eq!(out.delta.len(), 3);
        assert_eq!(out.delta.updates[0].position, Cursor(6));
    }

    #[tokio::test]
    async fn test_fetch_stops_at_budget() {
        let c = collaboration(1);
        let feed = ScriptedFeedClient::new(1).with_updates(c.id, adds(1, 50));
        let engine = DeltaEngine::new(20, 30, SignalType::ALL);

        let out = engine.fetch(&c, &checkpoint_at(&c, 0), &feed).await;
        assert_eq!(out.delta.len(), 30);
        assert_eq!(out.delta.end, Some(Cursor(30)));
        assert!(!out.delta.reached_live_edge);
        let limits: Vec<usize> = feed.calls().iter().map(|c| c.limit).collect();
        assert_eq!(limits, vec![20, 10]);
    }

    #[tokio::test]
    async fn test_fetch_failure_truncates() {
        let c = collaboration(1);
        let feed = ScriptedFeedClient::new(1).with_updates(c.id, adds(1, 50));
        feed.fail_after(2, FeedError::Transient("connection reset".into()));
        let engine = DeltaEngine::new(10, 1_000, SignalType::ALL);

        let out = engine.fetch(&c, &checkpoint_at(&c, 0), &feed).await;
        assert_eq!(out.error, Some(FeedError::Transient("connection reset".into())));
        assert_eq!(out.delta.len(), 20);
        assert_eq!(out.delta.end, Some(Cursor(20)));
    }

    #[tokio::test]
    async fn test_apply_filters_and_runs_hook_once() {
        let c = collaboration(1);
        let store = MemoryIndicatorStore::new();
        let hook = RecordingPostApply::new();
        let engine = DeltaEngine::new(10, 100, [SignalType::VideoMd5, SignalType::Pdq]);

        let mut delta = Delta::new(c.id, Cursor::ORIGIN);
        delta.extend_page(
            vec![
                typed_add("1", SignalType::VideoMd5, "aa", 1),
                typed_add("2", SignalType::Url, "https://example.org", 2),
                typed_add("3", SignalType::Pdq, "bb", 3),
            ],
            Cursor(3),
            true,
        );
        delta.finish();

        let report = engine.apply(&c, &delta, &store, &hook).await.unwrap();
        assert_eq!(report, ApplyReport { applied: 2, skipped: 1 });
        assert_eq!(store.records(c.id).await.unwrap().len(), 2);
        assert_eq!(hook.calls().len(), 1);
        assert_eq!(hook.calls()[0].end, Some(Cursor(3)));
    }

    #[tokio::test]
    async fn test_apply_empty_delta_skips_hook() {
        let c = collaboration(1);
        let hook = RecordingPostApply::new();
        let engine = DeltaEngine::new(10, 100, SignalType::ALL);
        let mut delta = Delta::new(c.id, Cursor(4));
        delta.finish();

        let report = engine
            .apply(&c, &delta, &MemoryIndicatorStore::new(), &hook)
            .await
            .unwrap();
        assert_eq!(report, ApplyReport::default());
        assert!(hook.calls().is_empty());
    }
}
