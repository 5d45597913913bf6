// Path: crates/node/src/lib.rs
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

//! Shared setup for the `fetcher` and `indexer` binaries.

pub mod indexer;

use hma_types::config::FetcherConfig;
use hma_types::error::ConfigError;
use std::path::Path;

/// Reads and validates a TOML configuration file.
pub fn load_config(path: &Path) -> Result<FetcherConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: FetcherConfig =
        toml::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Installs the Prometheus sink as the process-wide metrics sink.
pub fn install_metrics() -> anyhow::Result<()> {
    let sink = hma_telemetry::prometheus::install()?;
    hma_telemetry::sinks::SINK
        .set(sink)
        .map_err(|_| anyhow::anyhow!("metrics sink already installed"))?;
    Ok(())
}

/// Writes the current metrics in text exposition format, for scraping by a
/// node-exporter textfile collector once the batch job exits.
pub async fn write_metrics(path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("prom.partial");
    tokio::fs::write(&tmp, hma_telemetry::prometheus::render()).await?;
    tokio::fs::rename(&tmp, path).await
}
