//! Partition filtering and host-level disk aggregates

use crate::snapshot::{DiskInfo, HostSnapshot};

/// Partitions below 1 GiB (tmpfs, efivars, snap loops...) are left out of snapshots.
pub const MIN_PARTITION_BYTES: u64 = 1024 * 1024 * 1024;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Raw usage of one mounted partition, as read from the OS.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// Disk section of a snapshot: included partitions plus byte sums over them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskSummary {
    pub disks: Vec<DiskInfo>,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl PartitionUsage {
    pub fn is_tracked(&self) -> bool {
        self.total_bytes >= MIN_PARTITION_BYTES
    }

    fn to_disk_info(&self) -> DiskInfo {
        DiskInfo {
            path: self.mount_point.clone(),
            used_percent: HostSnapshot::percent_of(self.used_bytes, self.total_bytes),
            total_gb: self.total_bytes as f64 / BYTES_PER_GB,
            used_gb: self.used_bytes as f64 / BYTES_PER_GB,
        }
    }
}

/// Keeps partitions of at least `MIN_PARTITION_BYTES` and sums their usage.
/// Used > total is passed through unchanged.
pub fn summarize_partitions(partitions: &[PartitionUsage]) -> DiskSummary {
    let mut summary = DiskSummary::default();
    for part in partitions.iter().filter(|p| p.is_tracked()) {
        summary.disks.push(part.to_disk_info());
        summary.used_bytes = summary.used_bytes.saturating_add(part.used_bytes);
        summary.total_bytes = summary.total_bytes.saturating_add(part.total_bytes);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(mount: &str, total: u64, used: u64) -> PartitionUsage {
        PartitionUsage { mount_point: mount.into(), total_bytes: total, used_bytes: used }
    }

    #[test]
    fn test_threshold_boundary() {
        let parts = vec![
            part("/exact", MIN_PARTITION_BYTES, 0),
            part("/tiny", MIN_PARTITION_BYTES - 1, 0),
        ];
        let summary = summarize_partitions(&parts);
        assert_eq!(summary.disks.len(), 1);
        assert_eq!(summary.disks[0].path, "/exact");
        assert_eq!(summary.disks[0].total_gb, 1.0);
    }

    #[test]
    fn test_aggregates_only_tracked() {
        let parts = vec![
            part("/", 4 * MIN_PARTITION_BYTES, MIN_PARTITION_BYTES),
            part("/home", 2 * MIN_PARTITION_BYTES, MIN_PARTITION_BYTES),
            part("/boot/efi", 512 * 1024 * 1024, 100),
        ];
        let summary = summarize_partitions(&parts);
        assert_eq!(summary.disks.len(), 2);
        assert_eq!(summary.used_bytes, 2 * MIN_PARTITION_BYTES);
        assert_eq!(summary.total_bytes, 6 * MIN_PARTITION_BYTES);
        assert_eq!(summary.disks[0].used_percent, 25.0);
        assert_eq!(summary.disks[1].used_gb, 1.0);
    }

    #[test]
    fn test_overfull_partition_passes_through() {
        let summary = summarize_partitions(&[part("/weird", MIN_PARTITION_BYTES, 2 * MIN_PARTITION_BYTES)]);
        assert_eq!(summary.disks[0].used_percent, 200.0);
    }

    #[test]
    fn test_empty() {
        let summary = summarize_partitions(&[]);
        assert!(summary.disks.is_empty());
        assert_eq!(summary.total_bytes, 0);
    }
}
