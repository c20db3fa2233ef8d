//! HostPulse shared model
//!
//! Wire contract between the agent (`POST /report`) and the kernel (`GET /ws`, `GET /hosts`):
//! - `HostSnapshot`: one host's complete telemetry state, field names are the JSON contract
//! - `DiskInfo` / `PartitionUsage`: per-partition records and the 1 GiB inclusion threshold
//! - `derive_rate`: throughput from two cumulative counter readings

pub mod disk;
pub mod rate;
pub mod snapshot;

pub use disk::{summarize_partitions, DiskSummary, PartitionUsage, MIN_PARTITION_BYTES};
pub use rate::derive_rate;
pub use snapshot::{DiskInfo, HostSnapshot};
