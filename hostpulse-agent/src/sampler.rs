//! Local resource sampling for HostPulse agents
//!
//! One call = one best-effort reading of:
//! - CPU usage averaged over a short blocking window
//! - Memory / swap, load averages, uptime, process count
//! - Raw usage of every mounted partition (filtering happens in the collector)
//! - Cumulative network bytes summed over all interfaces
//! - TCP / UDP socket counts (Linux /proc tables, zero elsewhere)
//!
//! A source that cannot be read yields zero/empty, never an error.

use hostpulse_model::PartitionUsage;
use std::future::Future;
use std::time::Duration;
use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

/// Raw OS readings before normalization into a snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSample {
    pub cpu_percent: f64,
    pub mem_used: u64,
    pub mem_total: u64,
    pub swap_used: u64,
    pub swap_total: u64,
    pub load: [f64; 3],  // [1min, 5min, 15min]
    pub partitions: Vec<PartitionUsage>,
    pub net_recv: u64,
    pub net_sent: u64,
    pub uptime: u64,
    pub process_count: u64,
    pub tcp_conn_count: u64,
    pub udp_conn_count: u64,
}

/// Source of raw samples, driven once per collector tick
pub trait Sampler {
    fn sample(&mut self) -> impl Future<Output = RawSample> + Send;
}

/// Sampler backed by the sysinfo crate
pub struct SysinfoSampler {
    sys: System,
    disks: Disks,
    networks: Networks,
    cpu_window: Duration,
}

impl SysinfoSampler {
    pub fn new(cpu_window: Duration) -> Self {
        Self {
            sys: System::new(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            cpu_window: cpu_window.max(MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    pub fn cpu_window(&self) -> Duration {
        self.cpu_window
    }

    /// Blocks for the CPU window: usage needs two readings to mean anything.
    async fn cpu_percent(&mut self) -> f64 {
        self.sys.refresh_cpu_usage();
        tokio::time::sleep(self.cpu_window).await;
        self.sys.refresh_cpu_usage();
        self.sys.global_cpu_info().cpu_usage() as f64
    }

    fn partitions(&mut self) -> Vec<PartitionUsage> {
        self.disks.refresh_list();
        self.disks
            .iter()
            .map(|d| {
                let total = d.total_space();
                PartitionUsage {
                    mount_point: d.mount_point().to_string_lossy().to_string(),
                    total_bytes: total,
                    used_bytes: used_bytes(total, d.available_space()),
                }
            })
            .collect()
    }

    fn network_totals(&mut self) -> (u64, u64) {
        self.networks.refresh_list();
        self.networks
            .iter()
            .fold((0u64, 0u64), |(recv, sent), (_, data)| {
                (
                    recv.saturating_add(data.total_received()),
                    sent.saturating_add(data.total_transmitted()),
                )
            })
    }
}

impl Sampler for SysinfoSampler {
    async fn sample(&mut self) -> RawSample {
        let cpu_percent = self.cpu_percent().await;

        self.sys.refresh_memory();
        self.sys.refresh_processes();

        let load = System::load_average();
        let partitions = self.partitions();
        let (net_recv, net_sent) = self.network_totals();
        let (tcp_conn_count, udp_conn_count) = connection_counts();

        let sample = RawSample {
            cpu_percent,
            mem_used: self.sys.used_memory(),
            mem_total: self.sys.total_memory(),
            swap_used: self.sys.used_swap(),
            swap_total: self.sys.total_swap(),
            load: [load.one, load.five, load.fifteen],
            partitions,
            net_recv,
            net_sent,
            uptime: System::uptime(),
            process_count: self.sys.processes().len() as u64,
            tcp_conn_count,
            udp_conn_count,
        };
        debug!("sampled {} partitions, {} processes", sample.partitions.len(), sample.process_count);
        sample
    }
}

/// sysinfo only exposes space available to unprivileged users, so blocks
/// reserved for root count as used.
fn used_bytes(total: u64, available: u64) -> u64 {
    total.saturating_sub(available)
}

/// Rows of a /proc/net/{tcp,udp}[6] table, header excluded.
fn count_table_rows(table: &str) -> u64 {
    table.lines().skip(1).filter(|l| !l.trim().is_empty()).count() as u64
}

#[cfg(target_os = "linux")]
fn connection_counts() -> (u64, u64) {
    let count = |paths: &[&str]| -> u64 {
        paths
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok())
            .map(|t| count_table_rows(&t))
            .sum()
    };
    (
        count(&["/proc/net/tcp", "/proc/net/tcp6"]),
        count(&["/proc/net/udp", "/proc/net/udp6"]),
    )
}

#[cfg(not(target_os = "linux"))]
fn connection_counts() -> (u64, u64) {
    (0, 0)
}
