//! Audio filter implementations

pub mod trim;

pub use trim::{SilenceTrimmer, TrimBounds, TrimParams, find_bounds};

use crate::core::DecodedBuffer;
use crate::error::AudioResult;

/// Trait for audio filters
pub trait Filter {
    /// Process a buffer through this filter
    fn process(&mut self, buffer: &DecodedBuffer) -> AudioResult<DecodedBuffer>;
}
