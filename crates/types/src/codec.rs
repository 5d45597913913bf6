// Path: crates/types/src/codec.rs

//! Defines the binary codec for every record persisted by the workspace.
//!
//! Checkpoint rows, local indicator records and index snapshot envelopes are all
//! encoded with `bincode`. Centralizing the codec here keeps writers and readers
//! in different crates (and different processes) agreeing on one format.

use serde::{de::DeserializeOwned, Serialize};

/// Encodes a value into its stored byte representation.
pub fn to_bytes<T: Serialize + ?Sized>(v: &T) -> Result<Vec<u8>, String> {
    bincode::serialize(v).map_err(|e| format!("encode failed: {}", e))
}

/// Decodes a value from its stored byte representation.
///
/// Fails on malformed input and on trailing bytes that were not consumed, so a
/// record written for one type is not silently accepted as a shorter one.
pub fn from_bytes<T: DeserializeOwned>(b: &[u8]) -> Result<T, String> {
    use bincode::Options;
    bincode::options()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .deserialize(b)
        .map_err(|e| format!("decode failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
    struct Row {
        id: u64,
        name: String,
        tags: Vec<String>,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
    struct Short {
        id: u64,
    }

    #[test]
    fn test_codec_roundtrip() {
        let row = Row {
            id: 42,
            name: "collab".to_string(),
            tags: vec!["a".into(), "b".into()],
        };
        let bytes = to_bytes(&row).unwrap();
        assert_eq!(from_bytes::<Row>(&bytes).unwrap(), row);
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let row = Row {
            id: 7,
            name: "x".to_string(),
            tags: vec![],
        };
        let bytes = to_bytes(&row).unwrap();
        assert!(from_bytes::<Short>(&bytes).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(from_bytes::<Row>(&[0xff, 0x01]).is_err());
    }
}
