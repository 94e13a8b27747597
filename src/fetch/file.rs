//! Local filesystem fetcher

use super::Fetcher;
use crate::error::{AudioError, AudioResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Reads `file://` URLs and plain paths from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    /// Resolve paths as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        FileFetcher {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> AudioResult<Bytes> {
        let path = self.resolve(url);
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| AudioError::fetch(url, e))
    }
}
