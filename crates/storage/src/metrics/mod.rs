// Path: crates/storage/src/metrics/mod.rs
use hma_telemetry::sinks::IndexMetricsSink;

/// Forwards to whatever sink `hma_telemetry` has installed globally, or to the
/// no-op sink if none has been.
///
/// Lets stores hold an injectable `Arc<dyn IndexMetricsSink>` while still
/// defaulting to the process-wide sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalIndexSink;

impl IndexMetricsSink for GlobalIndexSink {
    fn observe_upload_duration(&self, index_type: &str, duration_secs: f64) {
        hma_telemetry::index_metrics().observe_upload_duration(index_type, duration_secs);
    }
    fn observe_download_duration(&self, index_type: &str, duration_secs: f64) {
        hma_telemetry::index_metrics().observe_download_duration(index_type, duration_secs);
    }
    fn inc_snapshot_errors(&self, index_type: &str, op: &'static str, code: &'static str) {
        hma_telemetry::index_metrics().inc_snapshot_errors(index_type, op, code);
    }
}
