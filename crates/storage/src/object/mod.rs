// Path: crates/storage/src/object/mod.rs
//! `ObjectStore` backends: a directory-per-bucket filesystem store and an
//! in-memory store.

mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use hma_types::error::StoreError;

/// Rejects bucket names and keys that could escape their bucket.
pub(crate) fn validate_location(bucket: &str, key: &str) -> Result<(), StoreError> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(StoreError::InvalidKey(format!("bad bucket name {:?}", bucket)));
    }
    if key.is_empty() {
        return Err(StoreError::InvalidKey("empty key".into()));
    }
    if key
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StoreError::InvalidKey(format!("bad key {:?}", key)));
    }
    Ok(())
}
