use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

const DEFAULT_BROADCAST_MS: u64 = 1000;
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub listen: String,               // ex: "0.0.0.0:8080"
    pub broadcast_interval_ms: u64,   // cadence du flux /ws
    pub push_timeout_secs: u64,       // viewer bloqué au-delà => flux coupé
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            broadcast_interval_ms: DEFAULT_BROADCAST_MS,
            push_timeout_secs: DEFAULT_PUSH_TIMEOUT_SECS,
        }
    }
}

impl KernelConfig {
    /// Zero would make the feed interval panic, fall back to the default cadence.
    pub fn broadcast_interval(&self) -> Duration {
        match self.broadcast_interval_ms {
            0 => Duration::from_millis(DEFAULT_BROADCAST_MS),
            ms => Duration::from_millis(ms),
        }
    }

    pub fn push_timeout(&self) -> Duration {
        match self.push_timeout_secs {
            0 => Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(listen) = std::env::var("HOSTPULSE_LISTEN") {
            if !listen.trim().is_empty() {
                self.listen = listen;
            }
        }
    }
}

/// Reads a YAML config file; a missing or blank file means defaults.
pub async fn load_config_from(path: &Path) -> Result<KernelConfig, ConfigError> {
    if !path.exists() {
        return Ok(KernelConfig::default());
    }
    let txt = fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    Ok(serde_yaml::from_str(&txt)?)
}

/// `$HOSTPULSE_KERNEL_CONFIG` or `kernel.yaml`, then env overrides. Never fails:
/// an invalid file is reported and replaced by defaults.
pub async fn load_config() -> KernelConfig {
    let path = std::env::var("HOSTPULSE_KERNEL_CONFIG").unwrap_or_else(|_| "kernel.yaml".into());
    let mut cfg = match load_config_from(Path::new(&path)).await {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("invalid config {path}: {e}, using defaults");
            KernelConfig::default()
        }
    };
    cfg.apply_env_overrides();
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("kernel.yaml")).await.unwrap();
        assert_eq!(cfg, KernelConfig::default());
    }

    #[tokio::test]
    async fn test_partial_yaml_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen: \"127.0.0.1:9000\"").unwrap();
        let cfg = load_config_from(file.path()).await.unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:9000");
        assert_eq!(cfg.broadcast_interval(), Duration::from_secs(1));
        assert_eq!(cfg.push_timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "broadcast_interval_ms: [not, a, number]").unwrap();
        assert!(matches!(load_config_from(file.path()).await, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_zero_durations_fall_back() {
        let cfg = KernelConfig { broadcast_interval_ms: 0, push_timeout_secs: 0, ..Default::default() };
        assert_eq!(cfg.broadcast_interval(), Duration::from_millis(1000));
        assert_eq!(cfg.push_timeout(), Duration::from_secs(10));
    }
}
