use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Local proxy endpoint that accepts synchronization feedback.
    pub feedback_url: String,
    pub request_timeout_ms: u64,
}

impl MessagingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            feedback_url: "http://localhost:8081/trustmesh/feedback".into(),
            request_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = MessagingConfig::default();
        assert!(c.feedback_url.ends_with("/trustmesh/feedback"));
        assert_eq!(c.request_timeout(), Duration::from_secs(5));
    }
}
