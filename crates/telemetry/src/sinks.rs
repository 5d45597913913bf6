// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.
//!
//! Every method returns `()`: reporting a metric cannot fail from the caller's
//! point of view. Backends swallow their own errors.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured sync-cycle metrics sink, or a no-op sink.
pub fn fetcher_metrics() -> &'static dyn FetcherMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured index snapshot metrics sink, or a no-op sink.
pub fn index_metrics() -> &'static dyn IndexMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured error metrics sink, or a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics of the fetch-apply cycle.
pub trait FetcherMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts updates read from the feed for a collaboration.
    fn inc_updates_fetched(&self, collaboration: &str, count: u64);
    /// Counts updates written to the local store for a collaboration.
    fn inc_updates_applied(&self, collaboration: &str, count: u64);
    /// Counts updates dropped because their signal type is not supported.
    fn inc_updates_skipped(&self, collaboration: &str, count: u64);
    /// Counts staleness-triggered checkpoint resets.
    fn inc_checkpoint_resets(&self, collaboration: &str);
    /// Counts finished cycles, labeled by outcome (`advanced`, `not_due`, `failed`, ...).
    fn inc_cycles(&self, outcome: &'static str);
    /// Observes the wall-clock duration of one collaboration's cycle.
    fn observe_cycle_duration(&self, collaboration: &str, duration_secs: f64);
    /// Records the checkpoint cursor after an advance.
    fn set_checkpoint_cursor(&self, collaboration: &str, cursor: u64);
}
impl FetcherMetricsSink for NopSink {
    fn inc_updates_fetched(&self, _collaboration: &str, _count: u64) {}
    fn inc_updates_applied(&self, _collaboration: &str, _count: u64) {}
    fn inc_updates_skipped(&self, _collaboration: &str, _count: u64) {}
    fn inc_checkpoint_resets(&self, _collaboration: &str) {}
    fn inc_cycles(&self, _outcome: &'static str) {}
    fn observe_cycle_duration(&self, _collaboration: &str, _duration_secs: f64) {}
    fn set_checkpoint_cursor(&self, _collaboration: &str, _cursor: u64) {}
}

/// A sink for metrics of the index snapshot store.
pub trait IndexMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes how long serializing and uploading one snapshot took.
    fn observe_upload_duration(&self, index_type: &str, duration_secs: f64);
    /// Observes how long downloading and deserializing one snapshot took.
    fn observe_download_duration(&self, index_type: &str, duration_secs: f64);
    /// Counts failed snapshot operations, labeled by operation and error code.
    fn inc_snapshot_errors(&self, index_type: &str, op: &'static str, code: &'static str);
}
impl IndexMetricsSink for NopSink {
    fn observe_upload_duration(&self, _index_type: &str, _duration_secs: f64) {}
    fn observe_download_duration(&self, _index_type: &str, _duration_secs: f64) {}
    fn inc_snapshot_errors(&self, _index_type: &str, _op: &'static str, _code: &'static str) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and code.
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink: FetcherMetricsSink + IndexMetricsSink + ErrorMetricsSink {}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where T: FetcherMetricsSink + IndexMetricsSink + ErrorMetricsSink {}
