// Path: crates/node/src/bin/indexer.rs
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

use anyhow::Result;
use clap::Parser;
use hma_storage::{FsObjectStore, InstrumentedIndexStore, SnapshotIndexStore};
use std::path::PathBuf;

/// Rebuilds the MD5 exact-match index from the fetcher's data files and
/// stores it as the bucket's index snapshot.
#[derive(Parser, Debug)]
#[clap(name = "indexer")]
struct IndexerOpts {
    #[clap(long, env = "HMA_CONFIG")]
    config: PathBuf,
    #[clap(long, env = "HMA_BUCKET", help = "Overrides bucket in the config file")]
    bucket: Option<String>,
    #[clap(long, env = "HMA_OBJECT_ROOT", default_value = "./hma-objects")]
    object_root: PathBuf,
    #[clap(long, env = "HMA_METRICS_FILE")]
    metrics_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    hma_telemetry::init::init_tracing()?;
    hma_node::install_metrics()?;

    let opts = IndexerOpts::parse();
    let mut config = hma_node::load_config(&opts.config)?;
    if let Some(bucket) = opts.bucket {
        config.bucket = bucket;
    }
    config.validate()?;

    let objects = FsObjectStore::new(&opts.object_root)?;
    let snapshots = InstrumentedIndexStore::new(SnapshotIndexStore::new(objects.clone()));
    let result =
        hma_node::indexer::rebuild(&objects, &snapshots, &config.bucket, &config.data_folder).await;

    if let Some(path) = &opts.metrics_file {
        if let Err(e) = hma_node::write_metrics(path).await {
            tracing::warn!(target: "indexer", error = %e, path = %path.display(), "failed to write metrics file");
        }
    }
    let index = result?;
    tracing::info!(target: "indexer", bucket = %config.bucket, digests = index.len(), "index snapshot saved");
    Ok(())
}
