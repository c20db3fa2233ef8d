//! HostPulse Agent - samples this host and reports to the kernel

use anyhow::{Context, Result};
use hostpulse_agent::{AgentConfig, Collector, HostIdentity, HttpReporter, SysinfoSampler};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("HostPulse Agent v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = AgentConfig::load().await;
    if config.interval() <= config.cpu_window() {
        warn!("interval {}s does not exceed the CPU window {}ms, ticks will run back to back",
              config.interval_secs, config.cpu_window_ms);
    }

    let identity = HostIdentity::discover(config.host_id.as_deref());
    let sampler = SysinfoSampler::new(config.cpu_window());
    let reporter = HttpReporter::new(config.server_url.clone(), config.timeout())
        .context("Failed to build HTTP client")?;

    info!("Reporting to {} every {}s", reporter.url(), config.interval_secs);

    let mut collector = Collector::new(identity, sampler);
    collector.run(&reporter, config.interval()).await;
    Ok(())
}
