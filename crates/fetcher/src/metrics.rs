// Path: crates/fetcher/src/metrics.rs
use hma_telemetry::sinks::FetcherMetricsSink;

/// Forwards to the process-wide sink installed in `hma_telemetry`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalFetcherSink;

impl FetcherMetricsSink for GlobalFetcherSink {
    fn inc_updates_fetched(&self, collaboration: &str, count: u64) {
        hma_telemetry::fetcher_metrics().inc_updates_fetched(collaboration, count);
    }
    fn inc_updates_applied(&self, collaboration: &str, count: u64) {
        hma_telemetry::fetcher_metrics().inc_updates_applied(collaboration, count);
    }
    fn inc_updates_skipped(&self, collaboration: &str, count: u64) {
        hma_telemetry::fetcher_metrics().inc_updates_skipped(collaboration, count);
    }
    fn inc_checkpoint_resets(&self, collaboration: &str) {
        hma_telemetry::fetcher_metrics().inc_checkpoint_resets(collaboration);
    }
    fn inc_cycles(&self, outcome: &'static str) {
        hma_telemetry::fetcher_metrics().inc_cycles(outcome);
    }
    fn observe_cycle_duration(&self, collaboration: &str, duration_secs: f64) {
        hma_telemetry::fetcher_metrics().observe_cycle_duration(collaboration, duration_secs);
    }
    fn set_checkpoint_cursor(&self, collaboration: &str, cursor: u64) {
        hma_telemetry::fetcher_metrics().set_checkpoint_cursor(collaboration, cursor);
    }
}
