// Path: crates/types/src/app/mod.rs
//! The replicated data model: collaborations, signals, checkpoints and deltas.

/// Checkpoint records and feed cursors.
pub mod checkpoint;
/// Collaborations (feed partitions) and their identifiers.
pub mod collaboration;
/// Deltas and the indicator updates they carry.
pub mod delta;
/// Signal (hash) types carried by indicators.
pub mod signal;

pub use checkpoint::{Checkpoint, CheckpointKey, Cursor};
pub use collaboration::{Collaboration, CollaborationId};
pub use delta::{Delta, IndicatorRecord, Update, UpdateKind};
pub use signal::SignalType;
