use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the reconciliation engine and worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on a single ledger fetch.
    pub fetch_timeout_ms: u64,
    /// Upper bound on a single store or directory call.
    pub store_timeout_ms: u64,
    /// Check the proof of received feedback before handing it downstream.
    pub verify_feedback_proofs: bool,
    /// Maximum number of results the worker reconciles at once.
    pub max_concurrency: usize,
}

impl EngineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            store_timeout_ms: 5_000,
            verify_feedback_proofs: true,
            max_concurrency: 8,
        }
    }
}
