//! Revocable in-memory resources.
//!
//! Encoded audio is published under a `blob:` URL so a renderer can load it
//! like any other source. A [`ResourceHandle`] is the single owner of that
//! URL: revoking it (explicitly or on drop) removes the bytes from the
//! registry, and revoking twice does nothing.

use crate::core::{BitDepth, DecodedBuffer};
use crate::encoder::Encoder;
use crate::encoder::wav::WavEncoder;
use crate::error::AudioResult;
use bytes::Bytes;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

const URL_SCHEME: &str = "blob:voice-compare/";

/// Process-wide table of published resources
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    inner: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish bytes and hand back the owning handle
    pub fn register(&self, bytes: Bytes) -> ResourceHandle {
        let url = format!("{URL_SCHEME}{}", Uuid::new_v4());
        self.inner.lock().insert(url.clone(), bytes);
        debug!("Registered {}", url);
        ResourceHandle {
            url,
            registry: self.clone(),
            revoked: AtomicBool::new(false),
        }
    }

    /// Look up the bytes behind a live URL
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.inner.lock().get(url).cloned()
    }

    /// Number of resources not yet revoked
    pub fn live_count(&self) -> usize {
        self.inner.lock().len()
    }

    fn remove(&self, url: &str) -> bool {
        self.inner.lock().remove(url).is_some()
    }
}

/// Owning reference to a published resource
pub struct ResourceHandle {
    url: String,
    registry: ResourceRegistry,
    revoked: AtomicBool,
}

impl ResourceHandle {
    /// URL the resource is reachable under
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the resource has been released
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    /// Release the resource. Returns `false` if it was already released.
    pub fn revoke(&self) -> bool {
        if self.revoked.swap(true, Ordering::AcqRel) {
            return false;
        }
        debug!("Revoked {}", self.url);
        self.registry.remove(&self.url)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("url", &self.url)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}

/// Trimmed audio encoded as WAV and published in a registry
#[derive(Debug)]
pub struct EncodedAsset {
    /// Encoded file image
    pub wav_bytes: Bytes,
    /// Owning handle of the published copy
    pub handle: ResourceHandle,
    /// Playback length
    pub duration: Duration,
}

impl EncodedAsset {
    /// Encode a buffer as WAV and publish it
    pub fn encode(
        buffer: &DecodedBuffer,
        bit_depth: BitDepth,
        registry: &ResourceRegistry,
    ) -> AudioResult<Self> {
        let wav_bytes = Bytes::from(WavEncoder::new(bit_depth).encode(buffer)?);
        let handle = registry.register(wav_bytes.clone());
        Ok(EncodedAsset {
            wav_bytes,
            handle,
            duration: buffer.duration(),
        })
    }

    /// Release the published copy
    pub fn revoke(&self) -> bool {
        self.handle.revoke()
    }
}
