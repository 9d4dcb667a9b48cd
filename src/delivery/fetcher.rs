//! Asset origin client

use crate::error::{DeliveryError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Something that can retrieve an asset URL
///
/// The planner only needs to know whether a request succeeded; the bytes
/// themselves end up in the origin/CDN cache and the browser.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch one asset, returning the number of bytes received
    async fn fetch(&self, url: &str) -> Result<u64>;
}

/// HTTP fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpAssetFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                        url: url.to_string(),
                    }
                } else {
                    DeliveryError::Fetch {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Fetch {
                url: url.to_string(),
                reason: format!("origin returned {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| DeliveryError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.len() as u64)
    }
}
