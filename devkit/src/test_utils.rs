/*!
Test Harness pour le pipeline HostPulse

Facilite l'écriture de tests de bout en bout avec:
- Un kernel réel (router axum) servi sur 127.0.0.1:0
- Une horloge manuelle pour contrôler les temps d'arrivée
- Un client HTTP pour poster des reports
- Un accès direct au store et au broadcaster pour les assertions
*/

use anyhow::{Context, Result};
use hostpulse_kernel::{build_router, AggregatorStore, AppState, KernelConfig, ManualClock};
use hostpulse_model::HostSnapshot;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;
use crate::feed_stub::{ChannelSink, FeedReceiver};

/// Harness de test complet: un kernel par test
pub struct TestHarness {
    pub state: AppState,
    pub clock: ManualClock,
    pub addr: SocketAddr,
    client: reqwest::Client,
    server: JoinHandle<()>,
}

impl TestHarness {
    /// Démarre un kernel avec l'horloge à t=0 et un flux rapide
    pub async fn start() -> Result<Self> {
        let cfg = KernelConfig {
            listen: "127.0.0.1:0".into(),
            broadcast_interval_ms: 50,
            ..Default::default()
        };
        Self::start_with(cfg).await
    }

    pub async fn start_with(cfg: KernelConfig) -> Result<Self> {
        init_logging();

        let clock = ManualClock::new(0);
        let store = Arc::new(AggregatorStore::new());
        let state = AppState::new(store, &cfg, clock.as_clock());

        let listener = TcpListener::bind(&cfg.listen)
            .await
            .with_context(|| format!("failed to bind {}", cfg.listen))?;
        let addr = listener.local_addr()?;
        let app = build_router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        info!("test kernel listening on {addr}");

        Ok(Self {
            state,
            clock,
            addr,
            client: reqwest::Client::new(),
            server,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn report_url(&self) -> String {
        format!("{}/report", self.base_url())
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn store(&self) -> &AggregatorStore {
        &self.state.store
    }

    /// POST d'un snapshot typé
    pub async fn post_report(&self, snapshot: &HostSnapshot) -> Result<(reqwest::StatusCode, Value)> {
        self.post_raw(serde_json::to_string(snapshot)?).await
    }

    /// POST d'un corps arbitraire (JSON invalide, champs manquants...)
    pub async fn post_raw(&self, body: impl Into<String>) -> Result<(reqwest::StatusCode, Value)> {
        let response = self
            .client
            .post(self.report_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let json = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok((status, json))
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(format!("{}{}", self.base_url(), path)).send().await?)
    }

    /// Branche un viewer en mémoire sur le broadcaster du kernel
    pub fn subscribe(&self) -> FeedReceiver {
        let (sink, rx) = ChannelSink::new();
        let broadcaster = self.state.broadcaster.clone();
        tokio::spawn(async move {
            let _ = broadcaster.serve(sink).await;
        });
        rx
    }

    /// Attend que le compteur de viewers atteigne `count`
    pub async fn wait_for_viewers(&self, count: u64, wait: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + wait;
        while tokio::time::Instant::now() < deadline {
            if self.state.health.get_health(self.store()).viewers_connected == count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
