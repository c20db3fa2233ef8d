//! Collection schedule: sample, derive throughput, assemble, report
//!
//! The collector keeps the previous tick's cumulative network counters and
//! the time they were read, so every snapshot carries the rate since the
//! tick just before it (not a long-run average). The first tick has no basis
//! and reports zero throughput.

use chrono::{DateTime, Utc};
use hostpulse_model::{derive_rate, summarize_partitions, HostSnapshot};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use crate::identity::HostIdentity;
use crate::reporter::{ReportError, Reporter};
use crate::sampler::{RawSample, Sampler};

#[derive(Debug, Clone, Copy)]
struct CounterReading {
    recv: u64,
    sent: u64,
    at: DateTime<Utc>,
}

pub struct Collector<S> {
    identity: HostIdentity,
    sampler: S,
    previous: Option<CounterReading>,
    in_speed: u64,
    out_speed: u64,
}

impl<S: Sampler> Collector<S> {
    pub fn new(identity: HostIdentity, sampler: S) -> Self {
        Self {
            identity,
            sampler,
            previous: None,
            in_speed: 0,
            out_speed: 0,
        }
    }

    /// Samples the host and builds a complete snapshot.
    pub async fn collect(&mut self) -> HostSnapshot {
        let raw = self.sampler.sample().await;
        self.assemble(raw, Utc::now())
    }

    /// Normalizes one raw sample observed at `observed_at`.
    pub fn assemble(&mut self, raw: RawSample, observed_at: DateTime<Utc>) -> HostSnapshot {
        self.update_rates(raw.net_recv, raw.net_sent, observed_at);
        let disk = summarize_partitions(&raw.partitions);

        HostSnapshot {
            host_id: self.identity.host_id.clone(),
            hostname: self.identity.hostname.clone(),
            os: self.identity.os.clone(),
            arch: self.identity.arch.clone(),
            platform: self.identity.platform.clone(),
            version: self.identity.version.clone(),
            cpu: raw.cpu_percent,
            mem_used: raw.mem_used,
            mem_total: raw.mem_total,
            swap_used: raw.swap_used,
            swap_total: raw.swap_total,
            memory: HostSnapshot::percent_of(raw.mem_used, raw.mem_total),
            disk_used: disk.used_bytes,
            disk_total: disk.total_bytes,
            disks: disk.disks,
            load_1: raw.load[0],
            load_5: raw.load[1],
            load_15: raw.load[2],
            net_recv: raw.net_recv,
            net_sent: raw.net_sent,
            net_in_speed: self.in_speed,
            net_out_speed: self.out_speed,
            uptime: raw.uptime,
            tcp_conn_count: raw.tcp_conn_count,
            udp_conn_count: raw.udp_conn_count,
            process_count: raw.process_count,
            updated_at: observed_at.timestamp(),
        }
    }

    /// A non-positive elapsed time keeps the previous rates; the reading
    /// always becomes the new basis.
    fn update_rates(&mut self, recv: u64, sent: u64, at: DateTime<Utc>) {
        if let Some(prev) = self.previous {
            let elapsed = (at - prev.at).num_milliseconds() as f64 / 1000.0;
            if let Some(rate) = derive_rate(prev.recv, recv, elapsed) {
                self.in_speed = rate;
            }
            if let Some(rate) = derive_rate(prev.sent, sent, elapsed) {
                self.out_speed = rate;
            }
        }
        self.previous = Some(CounterReading { recv, sent, at });
    }

    /// One tick: collect then deliver. Errors are logged and returned, never retried.
    pub async fn tick<R: Reporter>(&mut self, reporter: &R) -> Result<HostSnapshot, ReportError> {
        let snapshot = self.collect().await;
        match reporter.report(&snapshot).await {
            Ok(()) => {
                info!("Reported: CPU={:.1}%, Mem={:.1}%, Uptime={}s, Load1={:.2}",
                      snapshot.cpu, snapshot.memory, snapshot.uptime, snapshot.load_1);
                Ok(snapshot)
            }
            Err(e) => {
                error!("Error reporting state: {}", e);
                Err(e)
            }
        }
    }

    /// Runs forever: first tick immediately, then every `every`. A tick that
    /// overruns (slow report) skips the missed slots instead of bursting.
    pub async fn run<R: Reporter>(&mut self, reporter: &R, every: Duration) {
        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            timer.tick().await;
            let _ = self.tick(reporter).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hostpulse_model::{PartitionUsage, MIN_PARTITION_BYTES};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn identity() -> HostIdentity {
        HostIdentity {
            host_id: "h1".into(),
            hostname: "box".into(),
            os: "linux".into(),
            arch: "x86_64".into(),
            platform: "debian".into(),
            version: "12".into(),
        }
    }

    /// Replays prepared samples, then repeats the last one.
    struct ScriptedSampler {
        samples: VecDeque<RawSample>,
        last: RawSample,
    }

    impl ScriptedSampler {
        fn new(samples: Vec<RawSample>) -> Self {
            Self { samples: samples.into(), last: RawSample::default() }
        }
    }

    impl Sampler for ScriptedSampler {
        async fn sample(&mut self) -> RawSample {
            if let Some(next) = self.samples.pop_front() {
                self.last = next;
            }
            self.last.clone()
        }
    }

    #[derive(Clone, Default)]
    struct MemoryReporter {
        sent: Arc<Mutex<Vec<HostSnapshot>>>,
        fail: bool,
    }

    impl Reporter for MemoryReporter {
        async fn report(&self, snapshot: &HostSnapshot) -> Result<(), ReportError> {
            self.sent.lock().unwrap().push(snapshot.clone());
            if self.fail {
                return Err(ReportError::Status(reqwest::StatusCode::BAD_GATEWAY));
            }
            Ok(())
        }
    }

    fn net(recv: u64, sent: u64) -> RawSample {
        RawSample { net_recv: recv, net_sent: sent, ..Default::default() }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_tick_has_zero_throughput() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![]));
        let snap = c.assemble(net(50_000, 70_000), at(0));
        assert_eq!((snap.net_in_speed, snap.net_out_speed), (0, 0));
        assert_eq!(snap.net_recv, 50_000);
    }

    #[test]
    fn test_rate_against_previous_tick_only() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![]));
        c.assemble(net(0, 0), at(0));
        let second = c.assemble(net(3000, 6000), at(3));
        assert_eq!((second.net_in_speed, second.net_out_speed), (1000, 2000));

        // rolling: compares with t=3, not t=0
        let third = c.assemble(net(3500, 6000), at(4));
        assert_eq!((third.net_in_speed, third.net_out_speed), (500, 0));
    }

    #[test]
    fn test_clock_anomaly_keeps_prior_rate() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![]));
        c.assemble(net(0, 0), at(10));
        c.assemble(net(2000, 2000), at(12));
        let backwards = c.assemble(net(9000, 9000), at(11));
        assert_eq!(backwards.net_in_speed, 1000);

        // basis moved to the anomalous reading
        let next = c.assemble(net(10_000, 9000), at(12));
        assert_eq!(next.net_in_speed, 1000);
        assert_eq!(next.net_out_speed, 0);
    }

    #[test]
    fn test_counter_going_backwards_gives_zero() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![]));
        c.assemble(net(10_000, 10_000), at(0));
        let snap = c.assemble(net(100, 20_000), at(2));
        assert_eq!((snap.net_in_speed, snap.net_out_speed), (0, 5000));
    }

    #[test]
    fn test_snapshot_fields() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![]));
        let raw = RawSample {
            cpu_percent: 37.5,
            mem_used: 256,
            mem_total: 1024,
            swap_used: 1,
            swap_total: 2,
            load: [1.0, 0.5, 0.25],
            partitions: vec![
                PartitionUsage { mount_point: "/".into(), total_bytes: 2 * MIN_PARTITION_BYTES, used_bytes: MIN_PARTITION_BYTES },
                PartitionUsage { mount_point: "/run".into(), total_bytes: 1024, used_bytes: 10 },
            ],
            uptime: 99,
            process_count: 42,
            tcp_conn_count: 7,
            udp_conn_count: 3,
            ..Default::default()
        };
        let snap = c.assemble(raw, at(5));

        assert_eq!(snap.host_id, "h1");
        assert_eq!(snap.platform, "debian");
        assert_eq!(snap.memory, 25.0);
        assert_eq!(snap.disks.len(), 1);
        assert_eq!(snap.disk_total, 2 * MIN_PARTITION_BYTES);
        assert_eq!(snap.disk_used, MIN_PARTITION_BYTES);
        assert_eq!((snap.load_1, snap.load_5, snap.load_15), (1.0, 0.5, 0.25));
        assert_eq!((snap.tcp_conn_count, snap.udp_conn_count), (7, 3));
        assert_eq!(snap.updated_at, 1_700_000_005);
    }

    #[tokio::test]
    async fn test_tick_surfaces_report_failure() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![net(1, 1)]));
        let reporter = MemoryReporter { fail: true, ..Default::default() };
        assert!(c.tick(&reporter).await.is_err());
        assert_eq!(reporter.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_survives_failed_reports() {
        let mut c = Collector::new(identity(), ScriptedSampler::new(vec![]));
        let reporter = MemoryReporter { fail: true, ..Default::default() };

        let _ = tokio::time::timeout(Duration::from_millis(9500), c.run(&reporter, Duration::from_secs(3))).await;

        // ticks at 0s, 3s, 6s, 9s
        assert_eq!(reporter.sent.lock().unwrap().len(), 4);
    }
}
