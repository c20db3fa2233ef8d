/*!
Stub de viewer pour le flux live

`ChannelSink` implémente `FeedSink` sur un canal mpsc: chaque push du
broadcaster arrive côté test comme une chaîne JSON, sans socket.
*/

use anyhow::{anyhow, Result};
use hostpulse_kernel::{FeedError, FeedSink};
use hostpulse_model::HostSnapshot;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Viewer en mémoire; se ferme quand le récepteur est droppé
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

pub struct FeedReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, FeedReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, FeedReceiver { rx })
    }
}

impl FeedSink for ChannelSink {
    async fn push(&mut self, payload: String) -> Result<(), FeedError> {
        self.tx
            .send(payload)
            .map_err(|_| FeedError::Closed("test receiver dropped".into()))
    }

    /// Le drop du récepteur joue le rôle d'un Close côté viewer
    async fn closed(&mut self) -> FeedError {
        self.tx.closed().await;
        FeedError::Closed("test receiver dropped".into())
    }
}

impl FeedReceiver {
    /// Prochain push brut
    pub async fn next_payload(&mut self, wait: Duration) -> Result<String> {
        timeout(wait, self.rx.recv())
            .await
            .map_err(|_| anyhow!("no feed push within {:?}", wait))?
            .ok_or_else(|| anyhow!("feed closed"))
    }

    /// Prochain push décodé
    pub async fn next_batch(&mut self, wait: Duration) -> Result<Vec<HostSnapshot>> {
        let payload = self.next_payload(wait).await?;
        Ok(serde_json::from_str(&payload)?)
    }

    /// Vide les pushes déjà reçus, pour que le prochain reflète l'état courant
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while self.rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_reaches_receiver() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.push("[]".into()).await.unwrap();
        assert!(rx.next_batch(Duration::from_secs(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_receiver_closes_sink() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(matches!(sink.push("[]".into()).await, Err(FeedError::Closed(_))));
    }
}
