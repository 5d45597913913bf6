// Path: crates/api/src/lib.rs

//! # HMA API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # HMA API
//!
//! The traits the sync core and the snapshot index store consume. Every
//! external collaborator (remote feed, metadata store, object store, local
//! indicator store, collaboration registry) is reached only through one of
//! these seams, so implementations can be swapped without touching the core.

/// Re-exports all core error types from the central `hma-types` crate.
pub mod error;
/// Defines the `FeedClient` trait consumed by the delta engine.
pub mod feed;
/// Defines the `SignalIndex` capability and the `IndexStore` trait.
pub mod index;
/// Defines the local replica store and the post-apply hook.
pub mod indicators;
/// Defines the `CheckpointStore` trait backing the checkpoint manager.
pub mod metadata;
/// Defines the `ObjectStore` trait for bucket/key blob storage.
pub mod object;
/// Defines the `CollaborationRegistry` trait.
pub mod registry;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::error::ErrorCode;
    pub use crate::feed::{FeedClient, FeedPage};
    pub use crate::index::{IndexStore, IndexTypeId, SignalIndex};
    pub use crate::indicators::{IndicatorStore, PostApply};
    pub use crate::metadata::CheckpointStore;
    pub use crate::object::ObjectStore;
    pub use crate::registry::CollaborationRegistry;
}
