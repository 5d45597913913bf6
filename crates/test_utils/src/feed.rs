// Path: crates/test_utils/src/feed.rs
//! A scripted remote feed.

use async_trait::async_trait;
use hma_api::feed::{FeedClient, FeedPage};
use hma_types::app::{Collaboration, CollaborationId, Cursor, Update};
use hma_types::error::FeedError;
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded `fetch_incremental` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCall {
    pub collaboration: CollaborationId,
    pub resume: Cursor,
    pub limit: usize,
}

#[derive(Default)]
struct State {
    logs: HashMap<CollaborationId, Vec<Update>>,
    calls: Vec<FeedCall>,
    // Fail every call once this many calls have succeeded.
    fail_after: Option<(usize, FeedError)>,
    expired_before: HashMap<CollaborationId, Cursor>,
}

/// Serves per-collaboration update logs the way the remote feed pages them.
///
/// Updates are served in log order starting strictly after the resume cursor.
/// A page reaches the live edge once nothing is left after it.
pub struct ScriptedFeedClient {
    app_id: u64,
    state: Mutex<State>,
}

impl ScriptedFeedClient {
    pub fn new(app_id: u64) -> Self {
        Self {
            app_id,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Appends updates to a collaboration's log.
    pub fn push(&self, collaboration: CollaborationId, updates: impl IntoIterator<Item = Update>) {
        self.state()
            .logs
            .entry(collaboration)
            .or_default()
            .extend(updates);
    }

    pub fn with_updates(self, collaboration: CollaborationId, updates: Vec<Update>) -> Self {
        self.push(collaboration, updates);
        self
    }

    /// After `ok_calls` further successful calls, every call fails with `error`.
    pub fn fail_after(&self, ok_calls: usize, error: FeedError) {
        let done = self.state().calls.len();
        self.state().fail_after = Some((done + ok_calls, error));
    }

    pub fn heal(&self) {
        self.state().fail_after = None;
    }

    /// Resuming from any cursor below `cursor` fails with `CursorExpired`.
    pub fn expire_before(&self, collaboration: CollaborationId, cursor: Cursor) {
        self.state().expired_before.insert(collaboration, cursor);
    }

    pub fn calls(&self) -> Vec<FeedCall> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl FeedClient for ScriptedFeedClient {
    fn app_id(&self) -> u64 {
        self.app_id
    }

    async fn fetch_incremental(
        &self,
        collaboration: &Collaboration,
        resume: Cursor,
        limit: usize,
    ) -> Result<FeedPage, FeedError> {
        let mut state = self.state();
        let call_index = state.calls.len();
        state.calls.push(FeedCall {
            collaboration: collaboration.id,
            resume,
            limit,
        });
        if let Some((after, error)) = &state.fail_after {
            if call_index >= *after {
                return Err(error.clone());
            }
        }
        if let Some(floor) = state.expired_before.get(&collaboration.id) {
            if resume < *floor && !resume.is_origin() {
                return Err(FeedError::CursorExpired(resume));
            }
        }

        let log = state.logs.get(&collaboration.id).map(Vec::as_slice).unwrap_or(&[]);
        let remaining: Vec<&Update> = log.iter().filter(|u| u.position > resume).collect();
        let updates: Vec<Update> = remaining.iter().take(limit).map(|u| (*u).clone()).collect();
        let next_cursor = updates.last().map(|u| u.position).unwrap_or(resume);
        Ok(FeedPage {
            reached_live_edge: remaining.len() <= limit,
            updates,
            next_cursor,
        })
    }
}
