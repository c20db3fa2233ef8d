//! Agent configuration
//!
//! Handles:
//! - Kernel report endpoint and request timeout
//! - Reporting cadence and CPU sampling window
//! - Optional host_id override
//! - Cross-platform storage (TOML under the OS config dir)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const DEFAULT_SERVER_URL: &str = "http://localhost:8080/report";
const DEFAULT_INTERVAL_SECS: u64 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CPU_WINDOW_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("could not find config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub server_url: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub cpu_window_ms: u64,
    pub host_id: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cpu_window_ms: DEFAULT_CPU_WINDOW_MS,
            host_id: None,
        }
    }
}

impl AgentConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_window_ms)
    }

    /// `$HOSTPULSE_AGENT_CONFIG` or the OS-specific location, then env
    /// overrides. An unreadable file is reported and replaced by defaults.
    pub async fn load() -> Self {
        let path = match std::env::var("HOSTPULSE_AGENT_CONFIG") {
            Ok(p) if !p.trim().is_empty() => Ok(PathBuf::from(p)),
            _ => Self::config_file_path(),
        };

        let mut config = match path {
            Ok(path) => Self::load_from(&path).await.unwrap_or_else(|e| {
                warn!("invalid config {}: {}, using defaults", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Reads a TOML file; a missing file means defaults.
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: AgentConfig = toml::from_str(&content)?;
        config.fill_defaults();
        Ok(config)
    }

    /// Get OS-specific config file path
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("hostpulse-agent");
        path.push("config.toml");
        Ok(path)
    }

    /// Zero durations and blank strings keep the default.
    fn fill_defaults(&mut self) {
        let defaults = Self::default();
        if self.server_url.trim().is_empty() {
            self.server_url = defaults.server_url;
        }
        if self.interval_secs == 0 {
            self.interval_secs = defaults.interval_secs;
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = defaults.timeout_secs;
        }
        if self.cpu_window_ms == 0 {
            self.cpu_window_ms = defaults.cpu_window_ms;
        }
        if self.host_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            self.host_id = None;
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("HOSTPULSE_SERVER_URL").filter(|u| !u.trim().is_empty()) {
            self.server_url = url;
        }
        if let Some(raw) = lookup("HOSTPULSE_INTERVAL") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.interval_secs = secs,
                _ => warn!("ignoring HOSTPULSE_INTERVAL={raw:?}, expected a positive number of seconds"),
            }
        }
    }
}
