//! Simulated Backend
//!
//! A slow item source standing in for a database behind the cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::bail;
use tracing::debug;

use crate::cache::{Key, Mapping};

/// Item source with a fixed per-call latency.
///
/// Every non-negative id resolves to `value-<id>`; a negative id fails the
/// whole call.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    latency: Duration,
    calls: AtomicU64,
}

impl SimulatedBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            calls: AtomicU64::new(0),
        }
    }

    /// Loads `keys`, blocking the calling thread for the configured latency.
    pub fn fetch(&self, keys: &[Key]) -> anyhow::Result<Mapping<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(keys = keys.len(), "Backend fetch");

        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        if let Some(bad) = keys.iter().find(|&&k| k < 0) {
            bail!("item {} does not exist", bad);
        }
        Ok(keys.iter().map(|&k| (k, format!("value-{}", k))).collect())
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}
