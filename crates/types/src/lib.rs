// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # HMA Types
//!
//! The foundational library of the fetcher workspace: the replicated data model
//! (collaborations, checkpoints, deltas and updates), the fetcher configuration,
//! and the error taxonomy shared by every other crate.
//!
//! ## Architectural Role
//!
//! As the base crate, `hma-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. Keeping the data model
//! here prevents circular dependencies between the collaborator traits in
//! `hma-api` and their implementations in `hma-storage` and `hma-client`.

/// The application-level data model: collaborations, signals, checkpoints and deltas.
pub mod app;
/// The binary codec used for every record written to durable storage.
pub mod codec;
/// Configuration structures consumed by the fetcher and indexer.
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;

/// Returns the current wall-clock time as whole seconds since the unix epoch.
///
/// A clock before 1970 is reported as `0` rather than failing.
pub fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
