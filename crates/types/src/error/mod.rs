// Path: crates/types/src/error/mod.rs
//! Core error types for the fetcher workspace.

use crate::app::{CheckpointKey, Cursor};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A collaboration identifier from the registry is not numeric.
    #[error("collaboration id is not numeric: {0}")]
    NonNumericCollaboration(String),
    /// A setting is out of range or missing.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// The configuration source could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::NonNumericCollaboration(_) => "CONFIG_NON_NUMERIC_COLLABORATION",
            Self::Invalid(_) => "CONFIG_INVALID",
            Self::Load(_) => "CONFIG_LOAD_FAILED",
        }
    }
}

/// Errors from the metadata store that holds checkpoint rows.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The backing store could not be reached or returned an I/O failure.
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
    /// A stored checkpoint row could not be decoded.
    #[error("checkpoint row {key} is corrupt: {reason}")]
    Corrupt {
        /// The row that failed to decode.
        key: CheckpointKey,
        /// The decoder's message.
        reason: String,
    },
}

impl ErrorCode for MetadataError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "METADATA_UNAVAILABLE",
            Self::Corrupt { .. } => "METADATA_CORRUPT",
        }
    }
}

/// Errors returned by the remote feed client.
///
/// The split between transient and permanent failures only informs logging and
/// metrics; the core never retries on its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// A failure that may succeed on the next scheduled run (timeouts, 5xx, rate limits).
    #[error("transient feed error: {0}")]
    Transient(String),
    /// A failure that will not go away by itself (bad credentials, schema mismatch).
    #[error("permanent feed error: {0}")]
    Permanent(String),
    /// The feed no longer serves updates from the requested cursor.
    #[error("feed cursor {0} has expired")]
    CursorExpired(Cursor),
}

impl FeedError {
    /// True if retrying the whole cycle later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl ErrorCode for FeedError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transient(_) => "FEED_TRANSIENT",
            Self::Permanent(_) => "FEED_PERMANENT",
            Self::CursorExpired(_) => "FEED_CURSOR_EXPIRED",
        }
    }
}

/// Errors from the local indicator store and the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A failure in the underlying backend (redb, filesystem, network).
    #[error("backend error: {0}")]
    Backend(String),
    /// A record could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// A record could not be deserialized.
    #[error("decode error: {0}")]
    Decode(String),
    /// The key is not valid for this store.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STORE_BACKEND_ERROR",
            Self::Encode(_) => "STORE_ENCODE_ERROR",
            Self::Decode(_) => "STORE_DECODE_ERROR",
            Self::InvalidKey(_) => "STORE_INVALID_KEY",
        }
    }
}

/// Errors from the index snapshot store.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot exists at the type's key.
    #[error("no index snapshot at {bucket}/{key}")]
    NotFound {
        /// The bucket that was read.
        bucket: String,
        /// The object key that was read.
        key: String,
    },
    /// The snapshot exists but does not decode into the requested index type.
    #[error("index snapshot {key} is corrupt: {reason}")]
    Corrupt {
        /// The object key that was read.
        key: String,
        /// Why decoding failed.
        reason: String,
    },
    /// The index could not be serialized.
    #[error("failed to encode index {type_name}: {reason}")]
    Encode {
        /// The fully-qualified name of the index type.
        type_name: &'static str,
        /// The encoder's message.
        reason: String,
    },
    /// Two different index types claim the same storage name.
    #[error("index type name {0} is already registered by another type")]
    DuplicateType(&'static str),
    /// The object store failed.
    #[error("object store error: {0}")]
    Storage(#[from] StoreError),
}

impl ErrorCode for SnapshotError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "SNAPSHOT_NOT_FOUND",
            Self::Corrupt { .. } => "SNAPSHOT_CORRUPT",
            Self::Encode { .. } => "SNAPSHOT_ENCODE_ERROR",
            Self::DuplicateType(_) => "SNAPSHOT_DUPLICATE_TYPE",
            Self::Storage(_) => "SNAPSHOT_STORAGE_ERROR",
        }
    }
}

/// Errors raised by the checkpoint manager.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The metadata store failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// An advance would move the cursor backwards.
    #[error("refusing to move checkpoint {key} from {current} back to {proposed}")]
    Regression {
        /// The checkpoint being advanced.
        key: CheckpointKey,
        /// The stored cursor.
        current: Cursor,
        /// The cursor the delta ended at.
        proposed: Cursor,
    },
    /// An advance was attempted with a delta that never finished.
    #[error("delta for {0} has no end cursor")]
    UnfinishedDelta(CheckpointKey),
}

impl ErrorCode for CheckpointError {
    fn code(&self) -> &'static str {
        match self {
            Self::Metadata(e) => e.code(),
            Self::Regression { .. } => "CHECKPOINT_REGRESSION",
            Self::UnfinishedDelta(_) => "CHECKPOINT_UNFINISHED_DELTA",
        }
    }
}

/// Errors surfaced by one collaboration's fetch-apply cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The checkpoint could not be loaded, reset or advanced.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    /// The feed failed mid-stream; the updates retrieved before the failure were applied.
    #[error("feed fetch failed after {applied} updates were applied: {source}")]
    FeedFetch {
        /// How many updates were salvaged and applied.
        applied: usize,
        /// The feed failure.
        #[source]
        source: FeedError,
    },
    /// The feed failed before any update was retrieved; nothing was applied.
    #[error("no records fetched: {0}")]
    NoRecordsFetched(#[source] FeedError),
    /// Writing to the local store failed.
    #[error("apply failed: {0}")]
    Apply(#[source] StoreError),
    /// The post-apply hook failed after every update was written.
    #[error("post-apply hook failed: {0}")]
    PostApply(#[source] StoreError),
    /// The local replica could not be cleared ahead of a reset; the
    /// checkpoint was left as it was.
    #[error("could not clear replica for reset: {0}")]
    Reset(#[source] StoreError),
}

impl ErrorCode for SyncError {
    fn code(&self) -> &'static str {
        match self {
            Self::Checkpoint(e) => e.code(),
            Self::FeedFetch { .. } => "SYNC_FEED_FETCH_FAILED",
            Self::NoRecordsFetched(_) => "SYNC_NO_RECORDS_FETCHED",
            Self::Apply(_) => "SYNC_APPLY_FAILED",
            Self::PostApply(_) => "SYNC_POST_APPLY_FAILED",
            Self::Reset(_) => "SYNC_RESET_FAILED",
        }
    }
}

impl From<MetadataError> for SyncError {
    fn from(e: MetadataError) -> Self {
        Self::Checkpoint(CheckpointError::Metadata(e))
    }
}
