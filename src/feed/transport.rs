//! HTTP transports

use super::{FeedError, Transport};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// reqwest-backed transport: one attempt, bounded by the client timeout
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given timeout and User-Agent
    ///
    /// Fails rather than fall back to a client without the timeout.
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        tracing::debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))
    }
}

/// Transport that fails every request, used for offline runs
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        Err(FeedError::Network(format!("offline: {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_transport_always_fails() {
        let err = OfflineTransport
            .get_text("https://example.com/prices")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed: offline: https://example.com/prices");
    }

    #[test]
    fn test_http_transport_rejects_invalid_user_agent() {
        let result = HttpTransport::new(Duration::from_secs(1), "bad\nagent");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_transport_unreachable_host() {
        let transport =
            HttpTransport::new(Duration::from_millis(500), "metal-premium-test").unwrap();
        let result = transport.get_text("http://127.0.0.1:1/").await;
        assert!(matches!(result, Err(FeedError::Network(_))));
    }
}
