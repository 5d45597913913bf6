// Path: crates/types/src/config/mod.rs

//! Configuration structures for the fetcher and indexer.
//!
//! Loading (file, environment, secrets) happens in the binaries; the core only
//! ever receives an already-validated [`FetcherConfig`].
use crate::app::SignalType;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of the collaboration registry, as the registry stores it.
///
/// The identifier is kept as a string here because the registry is an
/// external system; it is validated when converted into a
/// [`Collaboration`](crate::app::Collaboration).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CollaborationConfig {
    /// The remote feed's partition identifier. Must parse as an unsigned integer.
    pub privacy_group_id: String,
    /// Human-readable name.
    pub privacy_group_name: String,
    /// The signal types the collaboration produces.
    #[serde(default)]
    pub signal_types: Vec<SignalType>,
}

/// Where and how to reach the remote feed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FeedEndpointConfig {
    /// Base URL of the feed API.
    pub base_url: String,
    /// The application id the API credential belongs to.
    pub app_id: u64,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_token_env() -> String {
    "HMA_FEED_API_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Settings consumed by the sync core and the index snapshot store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Object-storage bucket holding index snapshots and exported data files.
    pub bucket: String,
    /// Prefix inside the bucket for exported per-collaboration data files.
    #[serde(default = "default_data_folder")]
    pub data_folder: String,
    /// Directory holding the local durable state (checkpoint and indicator tables).
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Maximum checkpoint age before the replica is considered stale and reset.
    #[serde(default = "default_staleness_threshold_secs")]
    pub staleness_threshold_secs: u64,
    /// Maximum number of updates fetched in one cycle.
    #[serde(default = "default_batch_budget")]
    pub batch_budget: usize,
    /// Maximum number of updates requested per feed page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Minimum number of seconds between two fetches for one collaboration.
    #[serde(default)]
    pub fetch_interval_secs: u64,
    /// How many collaborations may be synced concurrently.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_collaborations: usize,
    /// Signal types kept in the local replica; other updates are skipped.
    #[serde(default = "default_supported_signal_types")]
    pub supported_signal_types: Vec<SignalType>,
    /// The collaborations to replicate.
    #[serde(default)]
    pub collaborations: Vec<CollaborationConfig>,
    /// The remote feed endpoint. Only required by the `fetcher` binary.
    #[serde(default)]
    pub feed: Option<FeedEndpointConfig>,
}

fn default_data_folder() -> String {
    "threat_exchange_data/".to_string()
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("./hma-state")
}
fn default_staleness_threshold_secs() -> u64 {
    // The upstream feed retains deletions for 90 days; older replicas may have
    // missed removals and must be rebuilt.
    90 * 24 * 60 * 60
}
fn default_batch_budget() -> usize {
    50_000
}
fn default_page_size() -> usize {
    500
}
fn default_max_concurrent() -> usize {
    1
}
fn default_supported_signal_types() -> Vec<SignalType> {
    vec![SignalType::VideoMd5, SignalType::Pdq]
}

impl FetcherConfig {
    /// A configuration with every default applied, for the given bucket.
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            data_folder: default_data_folder(),
            state_dir: default_state_dir(),
            staleness_threshold_secs: default_staleness_threshold_secs(),
            batch_budget: default_batch_budget(),
            page_size: default_page_size(),
            fetch_interval_secs: 0,
            max_concurrent_collaborations: default_max_concurrent(),
            supported_signal_types: default_supported_signal_types(),
            collaborations: Vec::new(),
            feed: None,
        }
    }

    /// Rejects settings the core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("bucket must not be empty".into()));
        }
        if self.batch_budget == 0 {
            return Err(ConfigError::Invalid("batch_budget must be positive".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        if self.max_concurrent_collaborations == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_collaborations must be positive".into(),
            ));
        }
        if self.staleness_threshold_secs == 0 {
            return Err(ConfigError::Invalid(
                "staleness_threshold_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
