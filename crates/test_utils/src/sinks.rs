// Path: crates/test_utils/src/sinks.rs
//! Metrics sinks that remember what they were told.

use hma_telemetry::sinks::{FetcherMetricsSink, IndexMetricsSink};
use std::collections::BTreeMap;
use std::sync::Mutex;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// Records index store metrics. A panicking sink panics on every call after
/// recording it.
#[derive(Debug, Default)]
pub struct CountingIndexSink {
    uploads: Mutex<Vec<String>>,
    downloads: Mutex<Vec<String>>,
    errors: Mutex<Vec<(String, &'static str, &'static str)>>,
    panic: bool,
}

impl CountingIndexSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        lock(&self.downloads).clone()
    }

    pub fn errors(&self) -> Vec<(String, &'static str, &'static str)> {
        lock(&self.errors).clone()
    }

    #[allow(clippy::panic)]
    fn maybe_panic(&self) {
        if self.panic {
            panic!("metrics backend exploded");
        }
    }
}

impl IndexMetricsSink for CountingIndexSink {
    fn observe_upload_duration(&self, index_type: &str, _duration_secs: f64) {
        lock(&self.uploads).push(index_type.to_string());
        self.maybe_panic();
    }

    fn observe_download_duration(&self, index_type: &str, _duration_secs: f64) {
        lock(&self.downloads).push(index_type.to_string());
        self.maybe_panic();
    }

    fn inc_snapshot_errors(&self, index_type: &str, op: &'static str, code: &'static str) {
        lock(&self.errors).push((index_type.to_string(), op, code));
        self.maybe_panic();
    }
}

/// Aggregates fetcher metrics by collaboration label.
#[derive(Debug, Default)]
pub struct RecordingFetcherSink {
    counters: Mutex<BTreeMap<(&'static str, String), u64>>,
    cycles: Mutex<BTreeMap<&'static str, u64>>,
    cursors: Mutex<BTreeMap<String, u64>>,
}

impl RecordingFetcherSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of counter `name` (`fetched`, `applied`, `skipped`, `resets`)
    /// for `collaboration`.
    pub fn counter(&self, name: &'static str, collaboration: &str) -> u64 {
        lock(&self.counters)
            .get(&(name, collaboration.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn cycles(&self, outcome: &'static str) -> u64 {
        lock(&self.cycles).get(outcome).copied().unwrap_or(0)
    }

    pub fn cursor(&self, collaboration: &str) -> Option<u64> {
        lock(&self.cursors).get(collaboration).copied()
    }

    fn add(&self, name: &'static str, collaboration: &str, count: u64) {
        *lock(&self.counters)
            .entry((name, collaboration.to_string()))
            .or_default() += count;
    }
}

impl FetcherMetricsSink for RecordingFetcherSink {
    fn inc_updates_fetched(&self, collaboration: &str, count: u64) {
        self.add("fetched", collaboration, count);
    }
    fn inc_updates_applied(&self, collaboration: &str, count: u64) {
        self.add("applied", collaboration, count);
    }
    fn inc_updates_skipped(&self, collaboration: &str, count: u64) {
        self.add("skipped", collaboration, count);
    }
    fn inc_checkpoint_resets(&self, collaboration: &str) {
        self.add("resets", collaboration, 1);
    }
    fn inc_cycles(&self, outcome: &'static str) {
        *lock(&self.cycles).entry(outcome).or_default() += 1;
    }
    fn observe_cycle_duration(&self, _collaboration: &str, _duration_secs: f64) {}
    fn set_checkpoint_cursor(&self, collaboration: &str, cursor: u64) {
        lock(&self.cursors).insert(collaboration.to_string(), cursor);
    }
}
