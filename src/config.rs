//! Configuration types for the crawler guard.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the crawler guard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerGuardConfig {
    /// Emit operator diagnostics (IP, User-Agent, matched rule, DNS results)
    pub verbose: bool,

    /// Reverse DNS resolver settings
    pub dns: DnsConfig,
}

impl CrawlerGuardConfig {
    /// Load configuration from a JSON or YAML file, picked by extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }
}

/// Reverse DNS resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Read name servers from the host (`/etc/resolv.conf` or equivalent)
    pub use_system_conf: bool,

    /// Per-query timeout in milliseconds
    pub timeout_ms: u64,

    /// Attempts per query before giving up
    pub attempts: usize,
}

impl DnsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            use_system_conf: true,
            timeout_ms: 2000,
            attempts: 1,
        }
    }
}
