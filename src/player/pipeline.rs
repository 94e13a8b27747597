//! Load pipeline for one track

use crate::core::{AudioSource, BitDepth};
use crate::decoder::decode_bytes;
use crate::encoder::{EncodedAsset, ResourceRegistry};
use crate::error::{AudioError, AudioResult};
use crate::fetch::Fetcher;
use crate::filter::{Filter, SilenceTrimmer, TrimBounds, TrimParams};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Output of one track's fetch, decode, trim and encode run
#[derive(Debug)]
pub struct PreparedTrack {
    /// Published WAV of the trimmed audio
    pub asset: EncodedAsset,
    /// Range kept from the decoded source
    pub bounds: TrimBounds,
    /// Length before trimming
    pub source_duration: Duration,
}

/// Fetch → decode → trim → encode for a single source
#[derive(Clone)]
pub struct TrackPipeline {
    fetcher: Arc<dyn Fetcher>,
    registry: ResourceRegistry,
    trim: TrimParams,
    bit_depth: BitDepth,
}

impl TrackPipeline {
    /// Create a pipeline publishing into `registry`
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        registry: ResourceRegistry,
        trim: TrimParams,
        bit_depth: BitDepth,
    ) -> AudioResult<Self> {
        trim.validate()?;
        Ok(TrackPipeline {
            fetcher,
            registry,
            trim,
            bit_depth,
        })
    }

    /// Registry the encoded assets are published in
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Trim parameters in use
    pub fn trim_params(&self) -> &TrimParams {
        &self.trim
    }

    /// Run the whole chain for `source`
    pub async fn prepare(&self, source: &AudioSource) -> AudioResult<PreparedTrack> {
        let bytes = self.fetcher.fetch(&source.url).await?;
        debug!("Fetched {} bytes for {}", bytes.len(), source.role);

        let ext = source.extension();
        let decoded = decode_bytes(bytes, ext.as_deref())?;
        let source_duration = decoded.duration();

        let mut trimmer = SilenceTrimmer::new(self.trim)?;
        let trimmed = trimmer.process(&decoded)?;
        let bounds = trimmer
            .last_bounds()
            .ok_or_else(|| AudioError::Buffer("Trimmer reported no bounds".to_string()))?;
        drop(decoded);

        let asset = EncodedAsset::encode(&trimmed, self.bit_depth, &self.registry)?;
        info!(
            "Prepared {} track: {:.2}s -> {:.2}s",
            source.role,
            source_duration.as_secs_f64(),
            asset.duration.as_secs_f64()
        );

        Ok(PreparedTrack {
            asset,
            bounds,
            source_duration,
        })
    }
}
