//! Deterministic randomness for reproducible tests

use hma_types::app::{Cursor, SignalType, Update, UpdateKind};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::BTreeSet;

/// Deterministic random number generator for tests
pub struct TestRng {
    rng: StdRng,
}

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_default_seed() -> Self {
        Self::new(12345)
    }

    /// A random lowercase hex MD5 digest.
    pub fn md5_hex(&mut self) -> String {
        let mut digest = [0u8; 16];
        self.rng.fill_bytes(&mut digest);
        hex::encode(digest)
    }

    /// A feed log of `len` updates over `keys` distinct indicators, at
    /// positions `1..=len`. Keys are reused, so later updates overwrite and
    /// remove earlier ones.
    pub fn update_stream(&mut self, len: u64, keys: u64) -> Vec<Update> {
        (1..=len)
            .map(|position| {
                let indicator_id = format!("ind-{}", self.rng.gen_range(0..keys.max(1)));
                let kind = match self.rng.gen_range(0..10) {
                    0..=5 => UpdateKind::Add,
                    6..=8 => UpdateKind::Modify,
                    _ => UpdateKind::Remove,
                };
                let value = match kind {
                    UpdateKind::Remove => None,
                    _ => Some(self.md5_hex()),
                };
                Update {
                    kind,
                    indicator_id,
                    signal_type: SignalType::VideoMd5,
                    value,
                    tags: BTreeSet::new(),
                    position: Cursor(position),
                }
            })
            .collect()
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::with_default_seed()
    }
}
