// Path: crates/api/src/error/mod.rs
//! Re-exports all core error types from the central `hma-types` crate.

pub use hma_types::error::*;
