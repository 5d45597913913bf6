// Path: crates/fetcher/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # HMA Fetcher
//!
//! Keeps a local replica of each collaboration's indicators in step with the
//! remote feed. One run performs one cycle per collaboration:
//!
//! ```text
//! load checkpoint -> (stale? reset) -> (due? fetch -> apply -> advance)
//! ```
//!
//! Nothing "in progress" is ever persisted. A run that dies mid-cycle leaves the
//! last advanced checkpoint in place and the next run re-fetches from there, so
//! updates are applied at least once and the apply step must be idempotent.

pub mod checkpoint;
pub mod cycle;
pub mod driver;
pub mod engine;
pub mod metrics;

pub use checkpoint::CheckpointManager;
pub use cycle::{CycleOutcome, CycleReport};
pub use driver::{RunReport, SyncContext};
pub use engine::{ApplyReport, DeltaEngine, FetchOutcome};
