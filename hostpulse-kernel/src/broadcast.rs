/**
 * BROADCASTER - Flux temps réel vers les viewers (/ws)
 *
 * ROLE: one push loop per connected viewer, full state every cycle.
 *
 * HOW IT WORKS:
 * - every interval: get_all() on the store, sort by host_id, encode as a JSON array, push
 * - first push happens as soon as the viewer connects
 * - a failed or timed-out push ends the loop for that viewer only, no retry
 * - a Close frame (or the stream ending) from the viewer ends the loop too,
 *   other client messages are read and dropped
 * - FeedSink abstracts the connection (WebSocket in production, channels in tests)
 */

use axum::extract::ws::{Message, WebSocket};
use hostpulse_model::HostSnapshot;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use crate::health::HealthTracker;
use crate::store::AggregatorStore;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("viewer connection closed: {0}")]
    Closed(String),
    #[error("push timed out after {0:?}")]
    Timeout(Duration),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One viewer connection, seen from the push side.
pub trait FeedSink {
    fn push(&mut self, payload: String) -> impl Future<Output = Result<(), FeedError>> + Send;

    /// Resolves once the viewer has gone away on its own. Must be cancel-safe:
    /// the feed loop drops it on every tick.
    fn closed(&mut self) -> impl Future<Output = FeedError> + Send {
        std::future::pending()
    }
}

/// All stored snapshots ordered by host_id.
pub fn snapshot_batch(store: &AggregatorStore) -> Vec<HostSnapshot> {
    let mut list = store.get_all();
    list.sort_by(|a, b| a.host_id.cmp(&b.host_id));
    list
}

#[derive(Clone)]
pub struct Broadcaster {
    store: Arc<AggregatorStore>,
    interval: Duration,
    health: HealthTracker,
}

impl Broadcaster {
    pub fn new(store: Arc<AggregatorStore>, interval: Duration, health: HealthTracker) -> Self {
        Self { store, interval, health }
    }

    /// Runs until the sink refuses a push or the viewer leaves; returns why.
    pub async fn serve<S: FeedSink>(&self, mut sink: S) -> FeedError {
        let _viewer = self.health.viewer_connected();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                reason = sink.closed() => {
                    debug!("viewer left: {}", reason);
                    return reason;
                }
            }
            let batch = snapshot_batch(&self.store);
            let payload = match serde_json::to_string(&batch) {
                Ok(p) => p,
                Err(e) => return e.into(),
            };
            if let Err(e) = sink.push(payload).await {
                debug!("viewer feed closed ({} hosts in last batch): {}", batch.len(), e);
                return e;
            }
        }
    }
}

/// WebSocket viewer: one text frame per batch, each bounded by `timeout`.
pub struct WsSink {
    socket: WebSocket,
    timeout: Duration,
}

impl WsSink {
    pub fn new(socket: WebSocket, timeout: Duration) -> Self {
        Self { socket, timeout }
    }
}

impl FeedSink for WsSink {
    async fn push(&mut self, payload: String) -> Result<(), FeedError> {
        match tokio::time::timeout(self.timeout, self.socket.send(Message::Text(payload.into()))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FeedError::Closed(e.to_string())),
            Err(_) => Err(FeedError::Timeout(self.timeout)),
        }
    }

    async fn closed(&mut self) -> FeedError {
        loop {
            match self.socket.recv().await {
                Some(Ok(Message::Close(_))) => {
                    // flushes the close reply queued by the handshake
                    let _ = tokio::time::timeout(self.timeout, self.socket.send(Message::Close(None))).await;
                    return FeedError::Closed("viewer sent close".into());
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return FeedError::Closed(e.to_string()),
                None => return FeedError::Closed("viewer stream ended".into()),
            }
        }
    }
}
