//! HTTP fetcher

use super::{Fetcher, ProxyRule};
use crate::error::{AudioError, AudioResult};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use reqwest::Client;

/// Fetches audio over HTTP, routing restricted origins through the proxy.
///
/// There is no request timeout: a stalled load is abandoned by starting a
/// new one, not cut off here.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    rule: ProxyRule,
}

impl HttpFetcher {
    /// Create a fetcher with its own client
    pub fn new(rule: ProxyRule) -> AudioResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("voice-compare/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AudioError::Config(e.to_string()))?;
        Ok(Self::with_client(client, rule))
    }

    /// Create a fetcher sharing an existing client
    pub fn with_client(client: Client, rule: ProxyRule) -> Self {
        HttpFetcher { client, rule }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> AudioResult<Bytes> {
        let target = self.rule.rewrite(url);
        if target != url {
            debug!("Proxying {} via {}", url, target);
        }

        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|e| AudioError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Fetching {} failed with HTTP {}", url, status);
            return Err(AudioError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}"),
            });
        }

        response.bytes().await.map_err(|e| AudioError::fetch(url, e))
    }
}
