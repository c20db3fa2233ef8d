//! Host identification for HostPulse agents
//!
//! Resolved once at startup, then stamped on every snapshot:
//! - host_id: configured override, else the hostname, else a random UUID
//! - hostname, OS family, architecture
//! - platform (distribution id) and OS version from sysinfo

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::{info, warn};

/// Identity fields of a host snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub host_id: String,
    pub hostname: String,
    pub os: String,
    pub arch: String,
    pub platform: String,
    pub version: String,
}

impl HostIdentity {
    /// Discover identity of the current host
    pub fn discover(host_id_override: Option<&str>) -> Self {
        let hostname = gethostname::gethostname()
            .to_string_lossy()
            .trim()
            .to_string();

        let host_id = Self::select_host_id(host_id_override, &hostname);

        let identity = HostIdentity {
            host_id,
            hostname,
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            platform: System::distribution_id(),
            version: System::os_version().unwrap_or_default(),
        };

        info!("Identity resolved - ID: {}, Hostname: {}, Platform: {} {}",
              identity.host_id, identity.hostname, identity.platform, identity.version);
        identity
    }

    fn select_host_id(host_id_override: Option<&str>, hostname: &str) -> String {
        if let Some(id) = host_id_override.map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        if !hostname.is_empty() {
            return hostname.to_string();
        }
        let generated = uuid::Uuid::new_v4().to_string();
        warn!("Hostname unavailable, using generated host_id {}", generated);
        generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        assert_eq!(HostIdentity::select_host_id(Some("rack-12"), "box"), "rack-12");
    }

    #[test]
    fn test_blank_override_falls_back_to_hostname() {
        assert_eq!(HostIdentity::select_host_id(Some("  "), "box"), "box");
        assert_eq!(HostIdentity::select_host_id(None, "box"), "box");
    }

    #[test]
    fn test_no_hostname_generates_id() {
        let id = HostIdentity::select_host_id(None, "");
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_discover() {
        let identity = HostIdentity::discover(None);
        assert!(!identity.host_id.is_empty());
        assert_eq!(identity.os, std::env::consts::OS);
        assert_eq!(identity.arch, std::env::consts::ARCH);
    }
}
