//! Retrieval of raw audio bytes

pub mod file;
pub mod http;

pub use file::FileFetcher;
pub use http::HttpFetcher;

use crate::error::AudioResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Path of the same-origin proxy endpoint
pub const PROXY_PATH: &str = "/audio-proxy";

/// Anything that can turn a URL into bytes
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the full body behind `url`
    async fn fetch(&self, url: &str) -> AudioResult<Bytes>;
}

/// Which origins must be reached through the audio proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    allowed_prefixes: Vec<String>,
    proxy_base: String,
}

impl ProxyRule {
    /// Create a rule routing `allowed_prefixes` through the proxy at `proxy_base`
    pub fn new(allowed_prefixes: Vec<String>, proxy_base: impl Into<String>) -> Self {
        ProxyRule {
            allowed_prefixes,
            proxy_base: proxy_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Prefixes on the allow-list
    pub fn allowed_prefixes(&self) -> &[String] {
        &self.allowed_prefixes
    }

    /// Whether `url` belongs to a restricted origin
    pub fn is_allowed(&self, url: &str) -> bool {
        self.allowed_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && url.starts_with(prefix.as_str()))
    }

    /// Route restricted URLs through the proxy, pass anything else through
    pub fn rewrite(&self, url: &str) -> String {
        if !self.is_allowed(url) {
            return url.to_string();
        }
        let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
        format!("{}{PROXY_PATH}?url={encoded}", self.proxy_base)
    }
}

/// Dispatches by scheme: HTTP(S) over the network, everything else from disk
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl SourceFetcher {
    /// Combine a network and a local fetcher
    pub fn new(http: HttpFetcher, file: FileFetcher) -> Self {
        SourceFetcher { http, file }
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, url: &str) -> AudioResult<Bytes> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url).await
        } else {
            self.file.fetch(url).await
        }
    }
}
