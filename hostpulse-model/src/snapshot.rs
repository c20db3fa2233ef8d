use serde::{Deserialize, Deserializer, Serialize};

/// Per-partition usage record, as sent in `disks[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub path: String,         // mount point, "/" or "C:\"
    pub used_percent: f64,
    pub total_gb: f64,
    pub used_gb: f64,
}

/// Complete telemetry state of one host (matches the `/report` body and `/ws` items).
///
/// Every field is required on ingestion except `updated_at`, which the kernel
/// overwrites with the arrival time anyway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub host_id: String,

    // System info
    pub hostname: String,
    pub os: String,           // linux, windows, macos
    pub arch: String,         // x86_64, aarch64
    pub platform: String,     // ubuntu, debian, windows
    pub version: String,      // "22.04", "10.0.19045"

    // Resources
    pub cpu: f64,
    pub mem_used: u64,
    pub mem_total: u64,
    pub swap_used: u64,
    pub swap_total: u64,
    /// Memory used percent.
    pub memory: f64,

    // Disk
    pub disk_used: u64,
    pub disk_total: u64,
    #[serde(deserialize_with = "null_as_empty")]
    pub disks: Vec<DiskInfo>,

    // Load
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,

    // Network: cumulative since boot, then derived bytes/sec
    pub net_recv: u64,
    pub net_sent: u64,
    pub net_in_speed: u64,
    pub net_out_speed: u64,

    // Status
    pub uptime: u64,
    pub tcp_conn_count: u64,
    pub udp_conn_count: u64,
    pub process_count: u64,

    /// Unix seconds, set by the kernel when the report is accepted.
    #[serde(default)]
    pub updated_at: i64,
}

/// Agents with no tracked partition send `"disks": null`; the key itself stays required.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl HostSnapshot {
    /// Used-percent helper shared by the sampler and test builders.
    pub fn percent_of(used: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        used as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_body() -> serde_json::Value {
        json!({
            "host_id": "h1", "hostname": "h1", "os": "linux", "arch": "x86_64",
            "platform": "ubuntu", "version": "22.04",
            "cpu": 12.5, "mem_used": 512, "mem_total": 1024,
            "swap_used": 0, "swap_total": 0, "memory": 50.0,
            "disk_used": 10, "disk_total": 20,
            "disks": [{"path": "/", "used_percent": 50.0, "total_gb": 20.0, "used_gb": 10.0}],
            "load_1": 0.5, "load_5": 0.4, "load_15": 0.3,
            "net_recv": 1000, "net_sent": 2000, "net_in_speed": 0, "net_out_speed": 0,
            "uptime": 3600, "tcp_conn_count": 4, "udp_conn_count": 2, "process_count": 120,
            "updated_at": 1700000000
        })
    }

    #[test]
    fn test_wire_field_names() {
        let snap: HostSnapshot = serde_json::from_value(full_body()).unwrap();
        assert_eq!(snap.host_id, "h1");
        assert_eq!(snap.net_recv, 1000);
        assert_eq!(snap.disks[0].path, "/");

        let back = serde_json::to_value(&snap).unwrap();
        assert_eq!(back, full_body());
    }

    #[test]
    fn test_updated_at_optional() {
        let mut body = full_body();
        body.as_object_mut().unwrap().remove("updated_at");
        let snap: HostSnapshot = serde_json::from_value(body).unwrap();
        assert_eq!(snap.updated_at, 0);
    }

    #[test]
    fn test_missing_structure_rejected() {
        let mut body = full_body();
        body.as_object_mut().unwrap().remove("disks");
        assert!(serde_json::from_value::<HostSnapshot>(body).is_err());

        let mut body = full_body();
        body["net_recv"] = json!("lots");
        assert!(serde_json::from_value::<HostSnapshot>(body).is_err());
    }

    #[test]
    fn test_null_disks_is_empty_list() {
        let mut body = full_body();
        body["disks"] = json!(null);
        let snap: HostSnapshot = serde_json::from_value(body).unwrap();
        assert!(snap.disks.is_empty());

        // still encoded as an array
        assert_eq!(serde_json::to_value(&snap).unwrap()["disks"], json!([]));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(HostSnapshot::percent_of(512, 1024), 50.0);
        assert_eq!(HostSnapshot::percent_of(5, 0), 0.0);
    }
}
