use std::path::Path;

use anyhow::Context;
use bl_engine::EngineConfig;
use bl_ledger::LedgerConfig;
use bl_messaging::MessagingConfig;
use bl_store::DirectoryConfig;
use serde::{Deserialize, Serialize};

const REDACTED: &str = "<redacted>";

/// Operator configuration, loaded from TOML. Every section is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
    pub ledger: LedgerConfig,
    pub messaging: MessagingConfig,
    pub engine: EngineConfig,
    pub directory: DirectoryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            ledger: LedgerConfig::default(),
            messaging: MessagingConfig::default(),
            engine: EngineConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Copy with workgroup keys and member tokens blanked out.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for workgroup in &mut config.directory.workgroups {
            workgroup.privatize_key = REDACTED.into();
        }
        for member in &mut config.directory.members {
            member.organization_token = REDACTED.into();
        }
        config
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to render config")
    }
}
