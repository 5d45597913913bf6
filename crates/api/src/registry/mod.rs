// Path: crates/api/src/registry/mod.rs

//! The external list of collaborations to replicate.

use async_trait::async_trait;
use hma_types::config::CollaborationConfig;
use hma_types::error::ConfigError;

/// Source of the collaborations a run should process.
///
/// Entries are returned unvalidated; the driver skips ones with a non-numeric id.
#[async_trait]
pub trait CollaborationRegistry: Send + Sync {
    /// Lists every known collaboration.
    async fn list(&self) -> Result<Vec<CollaborationConfig>, ConfigError>;
}

#[async_trait]
impl CollaborationRegistry for Vec<CollaborationConfig> {
    async fn list(&self) -> Result<Vec<CollaborationConfig>, ConfigError> {
        Ok(self.clone())
    }
}
