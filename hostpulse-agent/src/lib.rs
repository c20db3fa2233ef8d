//! HostPulse Agent - per-host resource reporter
//!
//! Samples the local machine on a fixed schedule and POSTs one complete
//! snapshot per tick to the kernel's `/report` endpoint.

pub mod collector;
pub mod config;
pub mod identity;
pub mod reporter;
pub mod sampler;

pub use collector::Collector;
pub use config::{AgentConfig, ConfigError};
pub use identity::HostIdentity;
pub use reporter::{HttpReporter, ReportError, Reporter};
pub use sampler::{RawSample, Sampler, SysinfoSampler};
