// Path: crates/node/src/bin/fetcher.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

use anyhow::{anyhow, Result};
use clap::Parser;
use hma_client::HttpFeedClient;
use hma_fetcher::SyncContext;
use hma_storage::{DataFileExporter, FsObjectStore, RedbCheckpointStore, RedbIndicatorStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Brings every configured collaboration's local replica up to date with the
/// remote feed, then exits. Exits non-zero if any collaboration failed.
#[derive(Parser, Debug)]
#[clap(name = "fetcher")]
struct FetcherOpts {
    #[clap(long, env = "HMA_CONFIG")]
    config: PathBuf,
    #[clap(long, env = "HMA_BUCKET", help = "Overrides bucket in the config file")]
    bucket: Option<String>,
    #[clap(long, env = "HMA_STATE_DIR", help = "Overrides state_dir in the config file")]
    state_dir: Option<PathBuf>,
    #[clap(long, env = "HMA_OBJECT_ROOT", default_value = "./hma-objects")]
    object_root: PathBuf,
    #[clap(long, env = "HMA_METRICS_FILE")]
    metrics_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    hma_telemetry::init::init_tracing()?;
    hma_node::install_metrics()?;

    let opts = FetcherOpts::parse();
    tracing::info!(target: "fetcher", event = "startup", config = %opts.config.display());

    let mut config = hma_node::load_config(&opts.config)?;
    if let Some(bucket) = opts.bucket {
        config.bucket = bucket;
    }
    if let Some(state_dir) = opts.state_dir {
        config.state_dir = state_dir;
    }
    config.validate()?;

    let feed_cfg = config
        .feed
        .as_ref()
        .ok_or_else(|| anyhow!("[feed] section is required"))?;
    let feed = Arc::new(HttpFeedClient::from_config(feed_cfg)?);

    tokio::fs::create_dir_all(&config.state_dir).await?;
    let checkpoints = Arc::new(RedbCheckpointStore::open(
        config.state_dir.join("checkpoints.redb"),
    )?);
    let indicators = Arc::new(RedbIndicatorStore::open(
        config.state_dir.join("indicators.redb"),
    )?);
    let objects = Arc::new(FsObjectStore::new(&opts.object_root)?);
    let exporter = DataFileExporter::new(
        indicators.clone(),
        objects,
        config.bucket.clone(),
        config.data_folder.clone(),
        config.supported_signal_types.iter().copied(),
    );

    let ctx = SyncContext::new(&config, feed, checkpoints, indicators, Arc::new(exporter));
    let report = ctx.run(&config.collaborations).await?;

    if let Some(path) = &opts.metrics_file {
        if let Err(e) = hma_node::write_metrics(path).await {
            tracing::warn!(target: "fetcher", error = %e, path = %path.display(), "failed to write metrics file");
        }
    }

    let failed: Vec<String> = report
        .failures()
        .map(|(c, e)| format!("{} ({}): {}", c.name, c.id, e))
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("{} collaboration(s) failed: {}", failed.len(), failed.join("; ")))
    }
}
