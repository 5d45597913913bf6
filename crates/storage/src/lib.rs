// Path: crates/storage/src/lib.rs
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

//! Durable backends for the fetcher and the index snapshot store.
//!
//! Checkpoint rows and the local indicator replica live in redb databases under
//! the configured state directory. Data files and index snapshots are blobs in
//! an [`ObjectStore`](hma_api::object::ObjectStore) bucket; [`FsObjectStore`]
//! maps buckets to directories.

pub mod checkpoint;
pub mod export;
pub mod index;
pub mod indicators;
pub mod instrumented;
pub mod metrics;
pub mod object;
pub mod snapshot;

pub use checkpoint::{MemoryCheckpointStore, RedbCheckpointStore};
pub use export::DataFileExporter;
pub use index::Md5ExactIndex;
pub use indicators::{MemoryIndicatorStore, RedbIndicatorStore};
pub use instrumented::InstrumentedIndexStore;
pub use object::{FsObjectStore, MemoryObjectStore};
pub use snapshot::{IndexRegistry, SnapshotIndexStore};
