// Path: crates/test_utils/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # HMA Test Utilities
//!
//! Doubles for every seam in `hma-api` plus builders for the records the
//! fetcher moves around. Doubles are in-memory and record what was done to
//! them so tests can assert on call order and arguments.

pub mod assertions;
pub mod feed;
pub mod fixtures;
pub mod hooks;
pub mod randomness;
pub mod sinks;
pub mod stores;
