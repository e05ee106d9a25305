use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// REST endpoint of the chain node, e.g. `http://starport:1317`.
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://starport:1317".into(),
            request_timeout_ms: 5_000,
        }
    }
}
