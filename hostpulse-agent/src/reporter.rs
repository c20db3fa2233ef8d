//! Delivery of snapshots to the kernel's `/report` endpoint
//!
//! One POST per snapshot, bounded by the client timeout. A failed delivery is
//! returned to the caller and the sample is dropped: the next tick supersedes it.

use hostpulse_model::HostSnapshot;
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("delivery to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("kernel returned status {0}")]
    Status(reqwest::StatusCode),
}

pub trait Reporter {
    fn report(&self, snapshot: &HostSnapshot) -> impl Future<Output = Result<(), ReportError>> + Send;
}

/// Posts snapshots as JSON over HTTP
#[derive(Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
}

impl HttpReporter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hostpulse-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Reporter for HttpReporter {
    async fn report(&self, snapshot: &HostSnapshot) -> Result<(), ReportError> {
        let body = serde_json::to_vec(snapshot)?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| ReportError::Transport { url: self.url.clone(), source })?;

        if !response.status().is_success() {
            return Err(ReportError::Status(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_kernel_is_transport_error() {
        // port 9 (discard) is closed on test machines, connection is refused fast
        let reporter = HttpReporter::new("http://127.0.0.1:9/report", Duration::from_secs(2)).unwrap();
        let err = reporter.report(&HostSnapshot::default()).await.unwrap_err();
        assert!(matches!(err, ReportError::Transport { .. }));
        assert!(err.to_string().contains("127.0.0.1:9"));
    }
}
