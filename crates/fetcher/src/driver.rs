// Path: crates/fetcher/src/driver.rs
//! The run entry point: one cycle per registered collaboration.

use crate::checkpoint::CheckpointManager;
use crate::cycle::CycleReport;
use crate::engine::DeltaEngine;
use crate::metrics::GlobalFetcherSink;
use futures::stream::{self, StreamExt};
use hma_api::feed::FeedClient;
use hma_api::indicators::{IndicatorStore, PostApply};
use hma_api::metadata::CheckpointStore;
use hma_api::registry::CollaborationRegistry;
use hma_telemetry::sinks::FetcherMetricsSink;
use hma_types::app::Collaboration;
use hma_types::config::FetcherConfig;
use hma_types::error::{ConfigError, SyncError};
use std::collections::HashSet;
use std::sync::Arc;

/// How many collaboration names the run summary lists before eliding.
const SUMMARY_NAMES: usize = 5;

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Everything a run needs, wired explicitly by the caller.
pub struct SyncContext {
    pub(crate) engine: DeltaEngine,
    pub(crate) checkpoints: CheckpointManager<dyn CheckpointStore>,
    pub(crate) feed: Arc<dyn FeedClient>,
    pub(crate) indicators: Arc<dyn IndicatorStore>,
    pub(crate) post_apply: Arc<dyn PostApply>,
    pub(crate) metrics: Arc<dyn FetcherMetricsSink>,
    clock: Clock,
    max_concurrent: usize,
}

impl SyncContext {
    pub fn new(
        config: &FetcherConfig,
        feed: Arc<dyn FeedClient>,
        checkpoints: Arc<dyn CheckpointStore>,
        indicators: Arc<dyn IndicatorStore>,
        post_apply: Arc<dyn PostApply>,
    ) -> Self {
        Self {
            engine: DeltaEngine::new(
                config.page_size,
                config.batch_budget,
                config.supported_signal_types.iter().copied(),
            ),
            checkpoints: CheckpointManager::new(
                checkpoints,
                feed.app_id(),
                config.staleness_threshold_secs,
                config.fetch_interval_secs,
            ),
            feed,
            indicators,
            post_apply,
            metrics: Arc::new(GlobalFetcherSink),
            clock: Arc::new(hma_types::now_unix_secs),
            max_concurrent: config.max_concurrent_collaborations.max(1),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn FetcherMetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replaces the wall clock (unix seconds) used for staleness and scheduling.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn checkpoints(&self) -> &CheckpointManager<dyn CheckpointStore> {
        &self.checkpoints
    }

    /// Runs one cycle for every collaboration the registry lists.
    ///
    /// Only a registry failure fails the run as a whole. Cycle failures are
    /// collected in the report so one broken collaboration does not stop the
    /// others.
    pub async fn run<R: CollaborationRegistry + ?Sized>(
        &self,
        registry: &R,
    ) -> Result<RunReport, ConfigError> {
        let configs = registry.list().await?;
        let names: Vec<&str> = configs
            .iter()
            .take(SUMMARY_NAMES)
            .map(|c| c.privacy_group_name.as_str())
            .collect();
        tracing::info!(
            target: "fetcher",
            count = configs.len(),
            names = %format!(
                "{}{}",
                names.join(", "),
                if configs.len() > SUMMARY_NAMES { ", ..." } else { "" }
            ),
            "found collaborations"
        );

        let mut skipped = Vec::new();
        let mut seen = HashSet::new();
        let mut collaborations = Vec::with_capacity(configs.len());
        for cfg in &configs {
            match Collaboration::try_from(cfg) {
                // One cycle per checkpoint row per run.
                Ok(c) if !seen.insert(c.id) => {
                    tracing::warn!(
                        target: "fetcher",
                        collaboration = %c.id,
                        name = %cfg.privacy_group_name,
                        "duplicate collaboration dropped"
                    );
                }
                Ok(c) => collaborations.push(c),
                Err(e) => {
                    tracing::warn!(
                        target: "fetcher",
                        name = %cfg.privacy_group_name,
                        error = %e,
                        "fetch skipped"
                    );
                    skipped.push(cfg.privacy_group_id.clone());
                }
            }
        }

        let now = (self.clock)();
        let cycles = stream::iter(collaborations)
            .map(|collaboration| async move {
                tracing::info!(
                    target: "fetcher",
                    collaboration = %collaboration.id,
                    name = %collaboration.name,
                    "processing updates for collaboration"
                );
                let result = self.run_cycle(&collaboration, now).await;
                if let Err(e) = &result {
                    tracing::error!(
                        target: "fetcher",
                        collaboration = %collaboration.id,
                        error = %e,
                        "cycle failed"
                    );
                }
                (collaboration, result)
            })
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        let report = RunReport { cycles, skipped };
        tracing::info!(
            target: "fetcher",
            succeeded = report.succeeded(),
            failed = report.failures().count(),
            skipped = report.skipped.len(),
            "run complete"
        );
        Ok(report)
    }
}

/// The per-collaboration results of one run, in completion order.
#[derive(Debug)]
pub struct RunReport {
    pub cycles: Vec<(Collaboration, Result<CycleReport, SyncError>)>,
    /// Raw ids of collaborations skipped for having a non-numeric id.
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = (&Collaboration, &SyncError)> {
        self.cycles
            .iter()
            .filter_map(|(c, r)| r.as_ref().err().map(|e| (c, e)))
    }

    pub fn succeeded(&self) -> usize {
        self.cycles.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn result_for(&self, id: u64) -> Option<&Result<CycleReport, SyncError>> {
        self.cycles
            .iter()
            .find(|(c, _)| c.id.0 == id)
            .map(|(_, r)| r)
    }
}
