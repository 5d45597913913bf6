// Path: crates/api/src/feed/mod.rs

//! The remote feed, as seen by the delta engine.

use async_trait::async_trait;
use hma_types::app::{Collaboration, Cursor, Update};
use hma_types::error::FeedError;
use serde::{Deserialize, Serialize};

/// One page of incremental updates returned by the remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    /// The updates, in feed order.
    pub updates: Vec<Update>,
    /// The position to resume from to read the page after this one.
    pub next_cursor: Cursor,
    /// True once the page ends at the feed's live edge.
    pub reached_live_edge: bool,
}

impl FeedPage {
    /// An empty page at the live edge.
    pub fn caught_up(at: Cursor) -> Self {
        Self {
            updates: Vec::new(),
            next_cursor: at,
            reached_live_edge: true,
        }
    }
}

/// A client for the remote, partitioned signal feed.
///
/// The wire protocol is entirely the implementation's business; the core only
/// pages through `fetch_incremental` until the live edge or its budget.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// The remote application id the client's credential belongs to.
    /// Checkpoints are kept per (collaboration, app) pair.
    fn app_id(&self) -> u64;

    /// Reads at most `limit` updates for `collaboration` starting right after `resume`.
    async fn fetch_incremental(
        &self,
        collaboration: &Collaboration,
        resume: Cursor,
        limit: usize,
    ) -> Result<FeedPage, FeedError>;
}
