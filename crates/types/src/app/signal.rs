// Path: crates/types/src/app/signal.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of hash or content signal an indicator carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// A 256-bit PDQ perceptual photo hash.
    Pdq,
    /// An MD5 digest of a video file.
    VideoMd5,
    /// An MD5 digest of a photo file.
    PhotoMd5,
    /// A raw URL.
    Url,
}

impl SignalType {
    /// Every known signal type, in a stable order.
    pub const ALL: [SignalType; 4] = [
        SignalType::Pdq,
        SignalType::VideoMd5,
        SignalType::PhotoMd5,
        SignalType::Url,
    ];

    /// The stable lowercase name used in data file names and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdq => "pdq",
            Self::VideoMd5 => "video_md5",
            Self::PhotoMd5 => "photo_md5",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown signal type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip_through_from_str() {
        for t in SignalType::ALL {
            assert_eq!(t.as_str().parse::<SignalType>().unwrap(), t);
        }
        assert!("sha1".parse::<SignalType>().is_err());
    }
}
