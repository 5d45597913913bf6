// Path: crates/types/src/app/collaboration.rs
use crate::app::SignalType;
use crate::config::CollaborationConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The numeric partition identifier of a collaboration in the remote feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollaborationId(pub u64);

impl fmt::Display for CollaborationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One data-sharing partition of the remote signal feed.
///
/// Immutable for the duration of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaboration {
    /// The numeric partition identifier.
    pub id: CollaborationId,
    /// Human-readable name, used only for logging.
    pub name: String,
    /// The signal types this collaboration produces.
    pub signal_types: BTreeSet<SignalType>,
}

impl Collaboration {
    /// Creates a collaboration from already-validated parts.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        signal_types: impl IntoIterator<Item = SignalType>,
    ) -> Self {
        Self {
            id: CollaborationId(id),
            name: name.into(),
            signal_types: signal_types.into_iter().collect(),
        }
    }
}

impl TryFrom<&CollaborationConfig> for Collaboration {
    type Error = ConfigError;

    fn try_from(cfg: &CollaborationConfig) -> Result<Self, Self::Error> {
        let id = cfg
            .privacy_group_id
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::NonNumericCollaboration(cfg.privacy_group_id.clone()))?;
        Ok(Self {
            id: CollaborationId(id),
            name: cfg.privacy_group_name.clone(),
            signal_types: cfg.signal_types.iter().copied().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(id: &str) -> CollaborationConfig {
        CollaborationConfig {
            privacy_group_id: id.to_string(),
            privacy_group_name: "Test Group".to_string(),
            signal_types: vec![SignalType::Pdq, SignalType::VideoMd5, SignalType::Pdq],
        }
    }

    #[test]
    fn test_numeric_id_converts() {
        let c = Collaboration::try_from(&cfg(" 303636684709969 ")).unwrap();
        assert_eq!(c.id, CollaborationId(303636684709969));
        assert_eq!(c.signal_types.len(), 2);
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let err = Collaboration::try_from(&cfg("inria-demo")).unwrap_err();
        assert!(matches!(err, ConfigError::NonNumericCollaboration(ref id) if id == "inria-demo"));
    }
}
