//! HostPulse kernel
//!
//! Central node of the telemetry pipeline: accepts host snapshots on `/report`,
//! keeps the latest one per host in a sharded concurrent store, and streams the
//! whole set to every connected viewer on `/ws`.

pub mod broadcast;
pub mod clock;
pub mod config;
pub mod health;
pub mod http;
pub mod store;

pub use broadcast::{Broadcaster, FeedError, FeedSink};
pub use clock::{system_clock, Clock, ManualClock};
pub use config::KernelConfig;
pub use http::{build_router, AppState};
pub use store::AggregatorStore;
