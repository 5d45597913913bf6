// Path: crates/fetcher/src/cycle.rs
//! One fetch-apply-advance cycle for a single collaboration.

use crate::driver::SyncContext;
use crate::engine::{ApplyReport, FetchOutcome};
use hma_telemetry::time::Timer;
use hma_types::app::{Collaboration, CollaborationId, Cursor};
use hma_types::error::{ErrorCode, FeedError, SyncError};

/// How a cycle ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The checkpoint's next fetch time has not passed.
    NotDue { next_fetch_after: u64 },
    /// The feed had nothing new; only the checkpoint timestamps moved.
    UpToDate { cursor: Cursor },
    /// A delta was applied and the checkpoint advanced to its end.
    Applied {
        report: ApplyReport,
        cursor: Cursor,
        reached_live_edge: bool,
    },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotDue { .. } => "not_due",
            Self::UpToDate { .. } => "up_to_date",
            Self::Applied { .. } => "applied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub collaboration: CollaborationId,
    /// True if the checkpoint was reset to the origin before fetching.
    pub reset: bool,
    pub outcome: CycleOutcome,
}

impl SyncContext {
    /// Runs one cycle: load, reset if stale, and if due fetch, apply and
    /// advance.
    ///
    /// A fetch that fails after retrieving updates still has them applied and
    /// the checkpoint advanced past them before the failure is returned as
    /// [`SyncError::FeedFetch`].
    pub async fn run_cycle(
        &self,
        collaboration: &Collaboration,
        now: u64,
    ) -> Result<CycleReport, SyncError> {
        let label = collaboration.id.to_string();
        let timer = Timer::new(|secs| self.metrics.observe_cycle_duration(&label, secs));
        let result = self.cycle(collaboration, now, &label).await;
        timer.stop();

        match &result {
            Ok(report) => self.metrics.inc_cycles(report.outcome.label()),
            Err(e) => {
                self.metrics.inc_cycles("failed");
                hma_telemetry::error_metrics().inc_error("sync", e.code());
            }
        }
        result
    }

    async fn cycle(
        &self,
        collaboration: &Collaboration,
        now: u64,
        label: &str,
    ) -> Result<CycleReport, SyncError> {
        let id = collaboration.id;
        let mut checkpoint = self.checkpoints.load(collaboration, now).await?;

        let mut reset = false;
        if self.checkpoints.is_stale(&checkpoint, now) {
            tracing::warn!(
                target: "fetcher",
                collaboration = %id,
                name = %collaboration.name,
                cursor = %checkpoint.cursor,
                flagged = checkpoint.stale,
                "store is stale; resetting"
            );
            // Removals missed while stale are only dropped by rebuilding from
            // an empty replica. Clear first: if the reset write fails the
            // checkpoint stays stale and the next run clears again.
            self.indicators
                .clear(id)
                .await
                .map_err(SyncError::Reset)?;
            checkpoint = self.checkpoints.reset(collaboration, now).await?;
            self.metrics.inc_checkpoint_resets(label);
            reset = true;
        }

        if !self.checkpoints.due(&checkpoint, now) {
            tracing::debug!(
                target: "fetcher",
                collaboration = %id,
                next_fetch_after = checkpoint.next_fetch_after,
                "not due yet"
            );
            return Ok(CycleReport {
                collaboration: id,
                reset,
                outcome: CycleOutcome::NotDue {
                    next_fetch_after: checkpoint.next_fetch_after,
                },
            });
        }

        let FetchOutcome { delta, error } = self
            .engine
            .fetch(collaboration, &checkpoint, self.feed.as_ref())
            .await;
        self.metrics.inc_updates_fetched(label, delta.len() as u64);
        if let Some(err) = &error {
            self.on_feed_error(collaboration, err, delta.len(), now).await;
        }

        if delta.is_empty() {
            if let Some(err) = error {
                tracing::error!(target: "fetcher", collaboration = %id, "failed before fetching any records");
                return Err(SyncError::NoRecordsFetched(err));
            }
            if reset {
                // Nothing came back to rewrite the exports; republish them
                // from the cleared replica.
                self.post_apply
                    .post_apply(collaboration, &delta)
                    .await
                    .map_err(SyncError::PostApply)?;
            }
            let advanced = self.checkpoints.advance(collaboration, &delta, now).await?;
            self.metrics.set_checkpoint_cursor(label, advanced.cursor.0);
            return Ok(CycleReport {
                collaboration: id,
                reset,
                outcome: CycleOutcome::UpToDate {
                    cursor: advanced.cursor,
                },
            });
        }

        tracing::info!(
            target: "fetcher",
            collaboration = %id,
            updates = delta.len(),
            "fetch complete, applying updates"
        );
        let report = match self
            .engine
            .apply(
                collaboration,
                &delta,
                self.indicators.as_ref(),
                self.post_apply.as_ref(),
            )
            .await
        {
            Ok(report) => report,
            Err(e) => {
                if let Some(fetch_err) = &error {
                    tracing::warn!(
                        target: "fetcher",
                        collaboration = %id,
                        class = fetch_err.code(),
                        error = %fetch_err,
                        "delta was truncated by a feed error before the apply failed"
                    );
                }
                return Err(e);
            }
        };
        self.metrics.inc_updates_applied(label, report.applied as u64);
        self.metrics.inc_updates_skipped(label, report.skipped as u64);

        let advanced = self.checkpoints.advance(collaboration, &delta, now).await?;
        self.metrics.set_checkpoint_cursor(label, advanced.cursor.0);

        if let Some(source) = error {
            return Err(SyncError::FeedFetch {
                applied: report.applied,
                source,
            });
        }
        Ok(CycleReport {
            collaboration: id,
            reset,
            outcome: CycleOutcome::Applied {
                report,
                cursor: advanced.cursor,
                reached_live_edge: delta.reached_live_edge,
            },
        })
    }

    async fn on_feed_error(
        &self,
        collaboration: &Collaboration,
        err: &FeedError,
        retrieved: usize,
        now: u64,
    ) {
        let id = collaboration.id;
        match err {
            FeedError::Transient(_) => {
                tracing::warn!(target: "fetcher", collaboration = %id, retrieved, error = %err, "transient feed error; next run resumes");
            }
            FeedError::Permanent(_) => {
                tracing::error!(target: "fetcher", collaboration = %id, retrieved, error = %err, "permanent feed error");
            }
            FeedError::CursorExpired(_) => {
                tracing::error!(target: "fetcher", collaboration = %id, retrieved, error = %err, "feed cursor expired; scheduling reset");
                if let Err(e) = self.checkpoints.mark_stale(collaboration, now).await {
                    tracing::error!(target: "fetcher", collaboration = %id, error = %e, "could not mark checkpoint stale");
                }
            }
        }
    }
}
