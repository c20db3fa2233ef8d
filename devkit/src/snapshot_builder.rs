/*!
Builder de snapshots pour les tests

Part d'un hôte plausible et ne modifie que ce que le test fixe.
*/

use hostpulse_model::{DiskInfo, HostSnapshot};
use serde_json::Value;

pub struct SnapshotBuilder {
    snapshot: HostSnapshot,
}

impl SnapshotBuilder {
    pub fn new(host_id: impl Into<String>) -> Self {
        let host_id = host_id.into();
        Self {
            snapshot: HostSnapshot {
                hostname: host_id.clone(),
                host_id,
                os: "linux".into(),
                arch: "x86_64".into(),
                platform: "debian".into(),
                version: "12".into(),
                mem_total: 8 << 30,
                mem_used: 2 << 30,
                memory: 25.0,
                uptime: 3600,
                process_count: 120,
                ..Default::default()
            },
        }
    }

    pub fn cpu(mut self, cpu: f64) -> Self {
        self.snapshot.cpu = cpu;
        self
    }

    pub fn net(mut self, recv: u64, sent: u64) -> Self {
        self.snapshot.net_recv = recv;
        self.snapshot.net_sent = sent;
        self
    }

    /// Débit déclaré par l'agent (écrasé par le kernel dès le 2e report)
    pub fn speeds(mut self, in_speed: u64, out_speed: u64) -> Self {
        self.snapshot.net_in_speed = in_speed;
        self.snapshot.net_out_speed = out_speed;
        self
    }

    pub fn disk(mut self, path: &str, total_gb: f64, used_gb: f64) -> Self {
        self.snapshot.disks.push(DiskInfo {
            path: path.into(),
            used_percent: if total_gb > 0.0 { used_gb / total_gb * 100.0 } else { 0.0 },
            total_gb,
            used_gb,
        });
        self
    }

    pub fn build(self) -> HostSnapshot {
        self.snapshot
    }

    pub fn to_json(&self) -> Value {
        // HostSnapshot ne contient que des types sérialisables
        serde_json::to_value(&self.snapshot).unwrap_or(Value::Null)
    }
}
