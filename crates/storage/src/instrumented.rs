// Path: crates/storage/src/instrumented.rs
//! Timing and error metrics around any [`IndexStore`].

use crate::metrics::GlobalIndexSink;
use async_trait::async_trait;
use hma_api::index::{IndexStore, SignalIndex};
use hma_telemetry::sinks::IndexMetricsSink;
use hma_telemetry::time::Timer;
use hma_types::error::{ErrorCode, SnapshotError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Wraps an [`IndexStore`] so every save is recorded as an upload and every
/// load as a download, labelled by the index type's name.
///
/// The inner result is returned unchanged. Metric calls run inside
/// `catch_unwind`, so a misbehaving sink cannot fail or alter an operation.
pub struct InstrumentedIndexStore<S> {
    inner: S,
    sink: Arc<dyn IndexMetricsSink>,
}

impl<S: IndexStore> InstrumentedIndexStore<S> {
    /// Reports to the process-wide sink installed in `hma_telemetry`.
    pub fn new(inner: S) -> Self {
        Self::with_sink(inner, Arc::new(GlobalIndexSink))
    }

    pub fn with_sink(inner: S, sink: Arc<dyn IndexMetricsSink>) -> Self {
        Self { inner, sink }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn record_error(&self, index_type: &str, op: &'static str, err: &SnapshotError) {
        let code = err.code();
        if catch_unwind(AssertUnwindSafe(|| {
            self.sink.inc_snapshot_errors(index_type, op, code)
        }))
        .is_err()
        {
            tracing::warn!(target: "snapshot", index_type, op, "metrics sink panicked; error count dropped");
        }
    }
}

#[async_trait]
impl<S: IndexStore> IndexStore for InstrumentedIndexStore<S> {
    async fn save<I: SignalIndex>(&self, index: &I, bucket: &str) -> Result<(), SnapshotError> {
        let index_type = I::TYPE_ID.name();
        let timer = Timer::new(|secs| self.sink.observe_upload_duration(index_type, secs));
        let result = self.inner.save(index, bucket).await;
        timer.stop();
        if let Err(e) = &result {
            self.record_error(index_type, "upload", e);
        }
        result
    }

    async fn load<I: SignalIndex>(&self, bucket: &str) -> Result<I, SnapshotError> {
        let index_type = I::TYPE_ID.name();
        let timer = Timer::new(|secs| self.sink.observe_download_duration(index_type, secs));
        let result = self.inner.load::<I>(bucket).await;
        timer.stop();
        if let Err(e) = &result {
            self.record_error(index_type, "download", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Md5ExactIndex;
    use crate::object::MemoryObjectStore;
    use crate::snapshot::SnapshotIndexStore;
    use hma_test_utils::fixtures::md5_record;
    use hma_test_utils::sinks::CountingIndexSink;

    fn store(sink: Arc<CountingIndexSink>) -> InstrumentedIndexStore<SnapshotIndexStore<MemoryObjectStore>> {
        InstrumentedIndexStore::with_sink(SnapshotIndexStore::new(MemoryObjectStore::new()), sink)
    }

    #[tokio::test]
    async fn test_records_upload_and_download() {
        let sink = Arc::new(CountingIndexSink::new());
        let store = store(sink.clone());
        let index = Md5ExactIndex::build(&[md5_record(1, "10", "d41d8cd98f00b204e9800998ecf8427e")]);

        store.save(&index, "b").await.unwrap();
        let loaded: Md5ExactIndex = store.load("b").await.unwrap();
        assert_eq!(loaded, index);

        assert_eq!(sink.uploads(), vec![Md5ExactIndex::TYPE_ID.name().to_string()]);
        assert_eq!(sink.downloads(), vec![Md5ExactIndex::TYPE_ID.name().to_string()]);
        assert!(sink.errors().is_empty());
    }

    #[tokio::test]
    async fn test_error_passes_through_and_is_counted() {
        let sink = Arc::new(CountingIndexSink::new());
        let store = store(sink.clone());

        let err = store.load::<Md5ExactIndex>("b").await.unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { .. }));
        assert_eq!(sink.downloads().len(), 1);
        assert_eq!(
            sink.errors(),
            vec![(
                Md5ExactIndex::TYPE_ID.name().to_string(),
                "download",
                "SNAPSHOT_NOT_FOUND"
            )]
        );
    }

    #[tokio::test]
    async fn test_panicking_sink_does_not_change_outcome() {
        let sink = Arc::new(CountingIndexSink::panicking());
        let store = store(sink);
        let index = Md5ExactIndex::build(&[md5_record(1, "10", "9e107d9d372bb6826bd81d3542a419d6")]);

        store.save(&index, "b").await.unwrap();
        assert_eq!(store.load::<Md5ExactIndex>("b").await.unwrap(), index);
        assert!(matches!(
            store.load::<Md5ExactIndex>("other").await.unwrap_err(),
            SnapshotError::NotFound { .. }
        ));
    }
}
