//! Leading/trailing silence removal.
//!
//! The first channel is cut into overlapping analysis frames and each frame's
//! RMS level is measured in dB. Frames quieter than `top_db` below the loudest
//! frame count as silence. The boundaries found on channel 0 are applied to
//! every channel, so a stereo file keeps its channels aligned.

use crate::core::DecodedBuffer;
use crate::error::{AudioError, AudioResult};
use log::debug;

/// Default analysis window, in samples
pub const DEFAULT_FRAME_LENGTH: usize = 2048;

/// Default stride between analysis windows, in samples
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Added to the RMS before taking the logarithm so silence stays finite
const RMS_EPSILON: f64 = 1e-10;

/// Parameters of the silence trimmer
///
/// `top_db` has no default on purpose: callers pick their own threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimParams {
    /// Threshold in dB below the loudest frame
    pub top_db: f32,
    /// Analysis window in samples
    pub frame_length: usize,
    /// Stride between windows in samples
    pub hop_length: usize,
}

impl TrimParams {
    /// Create parameters with the default frame and hop length
    pub fn new(top_db: f32) -> Self {
        TrimParams {
            top_db,
            frame_length: DEFAULT_FRAME_LENGTH,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }

    /// Set the analysis window
    pub fn with_frame_length(mut self, frame_length: usize) -> Self {
        self.frame_length = frame_length;
        self
    }

    /// Set the window stride
    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }

    /// Reject parameters the frame arithmetic cannot handle
    pub fn validate(&self) -> AudioResult<()> {
        if self.frame_length == 0 {
            return Err(AudioError::Config("frame_length must be positive".to_string()));
        }
        if self.hop_length == 0 {
            return Err(AudioError::Config("hop_length must be positive".to_string()));
        }
        if !self.top_db.is_finite() || self.top_db < 0.0 {
            return Err(AudioError::Config(format!(
                "top_db must be a non-negative number, got {}",
                self.top_db
            )));
        }
        Ok(())
    }
}

/// Sample range kept by the trimmer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimBounds {
    /// First kept sample
    pub start_sample: usize,
    /// One past the last kept sample
    pub end_sample: usize,
    /// True when nothing rose above the threshold and the input is kept whole
    pub degenerate: bool,
}

impl TrimBounds {
    fn identity(len: usize) -> Self {
        TrimBounds {
            start_sample: 0,
            end_sample: len,
            degenerate: true,
        }
    }

    /// Number of kept samples
    pub fn len(&self) -> usize {
        self.end_sample - self.start_sample
    }

    /// Whether the range is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the range covers the whole input of `len` samples
    pub fn is_full(&self, len: usize) -> bool {
        self.start_sample == 0 && self.end_sample == len
    }
}

/// Level reported for a frame of pure digital silence
fn silence_floor_db() -> f32 {
    (20.0 * RMS_EPSILON.log10()) as f32
}

/// Per-frame RMS level in dB for `floor((n - frame) / hop) + 1` frames.
///
/// Returns an empty vector when the input is shorter than one frame.
pub fn frame_levels_db(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let n = samples.len();
    if frame_length == 0 || hop_length == 0 || n < frame_length {
        return Vec::new();
    }

    // Prefix sums of squares give every window's energy in O(1)
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &s in samples {
        acc += f64::from(s) * f64::from(s);
        prefix.push(acc);
    }

    let frames = (n - frame_length) / hop_length + 1;
    (0..frames)
        .map(|i| {
            let start = i * hop_length;
            let energy = (prefix[start + frame_length] - prefix[start]).max(0.0);
            let rms = (energy / frame_length as f64).sqrt();
            (20.0 * (rms + RMS_EPSILON).log10()) as f32
        })
        .collect()
}

/// Decide the kept range of `samples`.
///
/// Scans forward and backward for the first frames whose level is not below
/// `max_db - top_db`. When no such pair of distinct frames exists the whole
/// input is kept.
pub fn find_bounds(samples: &[f32], params: &TrimParams) -> TrimBounds {
    let n = samples.len();
    let levels = frame_levels_db(samples, params.frame_length, params.hop_length);
    if levels.is_empty() {
        return TrimBounds::identity(n);
    }

    let max_db = levels.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    // A clip without any energy has nothing above its own floor
    if max_db <= silence_floor_db() {
        return TrimBounds::identity(n);
    }
    let threshold = max_db - params.top_db;

    let start_frame = levels.iter().position(|&db| db >= threshold);
    let end_frame = levels.iter().rposition(|&db| db >= threshold);

    match (start_frame, end_frame) {
        (Some(start), Some(end)) if start < end => TrimBounds {
            start_sample: start * params.hop_length,
            end_sample: n.min(end * params.hop_length + params.frame_length),
            degenerate: false,
        },
        _ => TrimBounds::identity(n),
    }
}

/// Silence trimming filter
#[derive(Debug, Clone)]
pub struct SilenceTrimmer {
    params: TrimParams,
    last_bounds: Option<TrimBounds>,
}

impl SilenceTrimmer {
    /// Create a trimmer, validating its parameters
    pub fn new(params: TrimParams) -> AudioResult<Self> {
        params.validate()?;
        Ok(SilenceTrimmer {
            params,
            last_bounds: None,
        })
    }

    /// Parameters in use
    pub fn params(&self) -> &TrimParams {
        &self.params
    }

    /// Bounds chosen by the most recent `process` call
    pub fn last_bounds(&self) -> Option<TrimBounds> {
        self.last_bounds
    }

    /// Trim a buffer and return the kept range along with the new buffer
    pub fn trim(&self, buffer: &DecodedBuffer) -> AudioResult<(DecodedBuffer, TrimBounds)> {
        let analysis = buffer
            .channel(0)
            .ok_or_else(|| AudioError::Buffer("Buffer has no channels".to_string()))?;
        let bounds = find_bounds(analysis, &self.params);

        if bounds.degenerate {
            debug!(
                "No frame above -{} dB relative threshold, keeping all {} samples",
                self.params.top_db,
                buffer.frame_count()
            );
            return Ok((buffer.clone(), bounds));
        }

        debug!(
            "Trimmed to samples {}..{} of {}",
            bounds.start_sample,
            bounds.end_sample,
            buffer.frame_count()
        );
        let trimmed = buffer.slice(bounds.start_sample, bounds.end_sample)?;
        Ok((trimmed, bounds))
    }
}

impl super::Filter for SilenceTrimmer {
    fn process(&mut self, buffer: &DecodedBuffer) -> AudioResult<DecodedBuffer> {
        let (trimmed, bounds) = self.trim(buffer)?;
        self.last_bounds = Some(bounds);
        Ok(trimmed)
    }
}
