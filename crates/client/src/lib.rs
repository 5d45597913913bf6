// Path: crates/client/src/lib.rs
//! # HMA Client Crate Lints
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
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # HMA Client
//!
//! A [`FeedClient`](hma_api::feed::FeedClient) that talks to the remote signal
//! feed over HTTPS.

pub mod http;
mod wire;

pub use http::HttpFeedClient;
