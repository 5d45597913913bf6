// Path: crates/test_utils/src/hooks.rs
use async_trait::async_trait;
use hma_api::indicators::PostApply;
use hma_types::app::{Collaboration, CollaborationId, Cursor};
use hma_types::error::StoreError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// What a `post_apply` call saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostApplyCall {
    pub collaboration: CollaborationId,
    pub updates: usize,
    pub end: Option<Cursor>,
}

/// Records every `post_apply` call, optionally failing them.
#[derive(Debug, Default)]
pub struct RecordingPostApply {
    calls: Mutex<Vec<PostApplyCall>>,
    fail: AtomicBool,
}

impl RecordingPostApply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let hook = Self::default();
        hook.fail.store(true, Ordering::SeqCst);
        hook
    }

    pub fn calls(&self) -> Vec<PostApplyCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl PostApply for RecordingPostApply {
    async fn post_apply(
        &self,
        collaboration: &Collaboration,
        delta: &hma_types::app::Delta,
    ) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(PostApplyCall {
                collaboration: collaboration.id,
                updates: delta.len(),
                end: delta.end,
            });
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("post-apply hook failed".into()));
        }
        Ok(())
    }
}
