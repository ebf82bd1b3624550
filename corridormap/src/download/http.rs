//! HTTP transport abstraction for tile fetches.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace, warn};

/// Identifying header sent with every tile request.
pub const USER_AGENT: &str = concat!(
    "CorridorMapAcquisition/",
    env!("CARGO_PKG_VERSION"),
    " (Educational/Research Project)"
);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failure of a single GET.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection, timeout or body read failure.
    #[error("Network error: {0}")]
    Network(String),
}

/// Asynchronous GET used by the tile downloader.
///
/// Implementations return the full response body on 2xx and classify
/// everything else into [`TransportError`].
pub trait TileTransport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl TileTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        trace!(url = url, "HTTP GET request starting");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(
                url = url,
                error = %e,
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            TransportError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(url = url, status = status.as_u16(), "HTTP response received");
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Network(format!("Failed to read response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_identifies_project() {
        assert!(USER_AGENT.starts_with("CorridorMapAcquisition/"));
        assert!(USER_AGENT.ends_with("(Educational/Research Project)"));
        assert!(USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::Status(429).to_string(), "HTTP status 429");
        assert_eq!(
            TransportError::Network("timed out".into()).to_string(),
            "Network error: timed out"
        );
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
