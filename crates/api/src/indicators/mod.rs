// Path: crates/api/src/indicators/mod.rs

//! The local replica of the feed and the hook run after every apply.

use async_trait::async_trait;
use hma_types::app::{Collaboration, CollaborationId, Delta, IndicatorRecord, Update};
use hma_types::error::StoreError;

/// The locally-owned durable copy of each collaboration's indicators.
#[async_trait]
pub trait IndicatorStore: Send + Sync {
    /// Writes `updates` in order, last write wins per indicator id.
    ///
    /// Removals delete the record; adds and modifications replace it. The
    /// batch is applied atomically: on error nothing from it is visible.
    async fn apply_batch(
        &self,
        collaboration: CollaborationId,
        updates: &[Update],
    ) -> Result<(), StoreError>;

    /// Reads a single indicator.
    async fn get(
        &self,
        collaboration: CollaborationId,
        indicator_id: &str,
    ) -> Result<Option<IndicatorRecord>, StoreError>;

    /// Reads every indicator of a collaboration, ordered by indicator id.
    async fn records(
        &self,
        collaboration: CollaborationId,
    ) -> Result<Vec<IndicatorRecord>, StoreError>;

    /// Drops every indicator of a collaboration before it is rebuilt from the
    /// origin. Other collaborations are untouched.
    async fn clear(&self, collaboration: CollaborationId) -> Result<(), StoreError>;
}

/// Work to run once after all updates of a delta were written, such as
/// re-exporting the data files that downstream index builders read.
#[async_trait]
pub trait PostApply: Send + Sync {
    /// Runs after `delta` was applied for `collaboration`.
    async fn post_apply(&self, collaboration: &Collaboration, delta: &Delta)
        -> Result<(), StoreError>;
}

/// A hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPostApply;

#[async_trait]
impl PostApply for NoopPostApply {
    async fn post_apply(&self, _: &Collaboration, _: &Delta) -> Result<(), StoreError> {
        Ok(())
    }
}
