// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.
//!
//! The fetcher is a batch job, so nothing scrapes it; [`render`] produces the
//! text exposition format for the binaries to write out at the end of a run.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    Encoder, HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};

// --- Metric Statics ---
// Initialized exactly once by `install`. Until then every sink method is a no-op.

static UPDATES_FETCHED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static UPDATES_APPLIED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static UPDATES_SKIPPED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CHECKPOINT_RESETS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CYCLES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CYCLE_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static CHECKPOINT_CURSOR: OnceCell<IntGaugeVec> = OnceCell::new();
static INDEX_UPLOAD_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static INDEX_DOWNLOAD_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static SNAPSHOT_ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Bumps a labeled counter if it has been registered. A label-cardinality
/// mismatch is logged at debug level and dropped.
fn inc_counter(metric: &OnceCell<IntCounterVec>, labels: &[&str], by: u64) {
    let Some(vec) = metric.get() else { return };
    match vec.get_metric_with_label_values(labels) {
        Ok(c) => c.inc_by(by),
        Err(e) => tracing::debug!(target: "telemetry", error = %e, "dropping counter sample"),
    }
}

fn observe(metric: &OnceCell<HistogramVec>, labels: &[&str], value: f64) {
    let Some(vec) = metric.get() else { return };
    match vec.get_metric_with_label_values(labels) {
        Ok(h) => h.observe(value),
        Err(e) => tracing::debug!(target: "telemetry", error = %e, "dropping histogram sample"),
    }
}

impl FetcherMetricsSink for PrometheusSink {
    fn inc_updates_fetched(&self, collaboration: &str, count: u64) {
        inc_counter(&UPDATES_FETCHED_TOTAL, &[collaboration], count);
    }
    fn inc_updates_applied(&self, collaboration: &str, count: u64) {
        inc_counter(&UPDATES_APPLIED_TOTAL, &[collaboration], count);
    }
    fn inc_updates_skipped(&self, collaboration: &str, count: u64) {
        inc_counter(&UPDATES_SKIPPED_TOTAL, &[collaboration], count);
    }
    fn inc_checkpoint_resets(&self, collaboration: &str) {
        inc_counter(&CHECKPOINT_RESETS_TOTAL, &[collaboration], 1);
    }
    fn inc_cycles(&self, outcome: &'static str) {
        inc_counter(&CYCLES_TOTAL, &[outcome], 1);
    }
    fn observe_cycle_duration(&self, collaboration: &str, duration_secs: f64) {
        observe(&CYCLE_DURATION_SECONDS, &[collaboration], duration_secs);
    }
    fn set_checkpoint_cursor(&self, collaboration: &str, cursor: u64) {
        let Some(vec) = CHECKPOINT_CURSOR.get() else { return };
        if let Ok(g) = vec.get_metric_with_label_values(&[collaboration]) {
            g.set(i64::try_from(cursor).unwrap_or(i64::MAX));
        }
    }
}

impl IndexMetricsSink for PrometheusSink {
    fn observe_upload_duration(&self, index_type: &str, duration_secs: f64) {
        observe(&INDEX_UPLOAD_SECONDS, &[index_type], duration_secs);
    }
    fn observe_download_duration(&self, index_type: &str, duration_secs: f64) {
        observe(&INDEX_DOWNLOAD_SECONDS, &[index_type], duration_secs);
    }
    fn inc_snapshot_errors(&self, index_type: &str, op: &'static str, code: &'static str) {
        inc_counter(&SNAPSHOT_ERRORS_TOTAL, &[index_type, op, code], 1);
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        inc_counter(&ERRORS_TOTAL, &[kind, code], 1);
    }
}

fn set_once<T>(cell: &OnceCell<T>, value: T) -> Result<(), prometheus::Error> {
    cell.set(value)
        .map_err(|_| prometheus::Error::Msg("prometheus sink already installed".into()))
}

/// Registers every collector with the default registry and returns the sink.
/// Must be called at most once per process.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    set_once(
        &UPDATES_FETCHED_TOTAL,
        register_int_counter_vec!(
            "hma_fetcher_updates_fetched_total",
            "Updates read from the remote feed.",
            &["collaboration"]
        )?,
    )?;
    set_once(
        &UPDATES_APPLIED_TOTAL,
        register_int_counter_vec!(
            "hma_fetcher_updates_applied_total",
            "Updates written to the local indicator store.",
            &["collaboration"]
        )?,
    )?;
    set_once(
        &UPDATES_SKIPPED_TOTAL,
        register_int_counter_vec!(
            "hma_fetcher_updates_skipped_total",
            "Updates dropped because their signal type is not supported.",
            &["collaboration"]
        )?,
    )?;
    set_once(
        &CHECKPOINT_RESETS_TOTAL,
        register_int_counter_vec!(
            "hma_fetcher_checkpoint_resets_total",
            "Staleness-triggered checkpoint resets.",
            &["collaboration"]
        )?,
    )?;
    set_once(
        &CYCLES_TOTAL,
        register_int_counter_vec!(
            "hma_fetcher_cycles_total",
            "Finished fetch-apply cycles by outcome.",
            &["outcome"]
        )?,
    )?;
    set_once(
        &CYCLE_DURATION_SECONDS,
        register_histogram_vec!(
            "hma_fetcher_cycle_duration_seconds",
            "Wall-clock duration of one collaboration's fetch-apply cycle.",
            &["collaboration"],
            exponential_buckets(0.05, 2.0, 14)?
        )?,
    )?;
    set_once(
        &CHECKPOINT_CURSOR,
        register_int_gauge_vec!(
            "hma_fetcher_checkpoint_cursor",
            "Checkpoint cursor after the last advance.",
            &["collaboration"]
        )?,
    )?;
    set_once(
        &INDEX_UPLOAD_SECONDS,
        register_histogram_vec!(
            "hma_indexer_upload_index_seconds",
            "Time to serialize and upload one index snapshot.",
            &["index_type"],
            exponential_buckets(0.01, 2.0, 14)?
        )?,
    )?;
    set_once(
        &INDEX_DOWNLOAD_SECONDS,
        register_histogram_vec!(
            "hma_indexer_download_index_seconds",
            "Time to download and deserialize one index snapshot.",
            &["index_type"],
            exponential_buckets(0.01, 2.0, 14)?
        )?,
    )?;
    set_once(
        &SNAPSHOT_ERRORS_TOTAL,
        register_int_counter_vec!(
            "hma_indexer_snapshot_errors_total",
            "Failed snapshot operations.",
            &["index_type", "op", "code"]
        )?,
    )?;
    set_once(
        &ERRORS_TOTAL,
        register_int_counter_vec!(
            "hma_errors_total",
            "Total number of errors, categorized by kind and code.",
            &["kind", "code"]
        )?,
    )?;

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}

/// Encodes everything in the default registry in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::with_capacity(16 * 1024);
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(target: "telemetry", error = %e, "Failed to encode prometheus metrics");
    }
    String::from_utf8_lossy(&buf).into_owned()
}
