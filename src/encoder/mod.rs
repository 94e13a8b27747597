//! Audio encoder implementations

pub mod asset;
pub mod wav;

pub use asset::{EncodedAsset, ResourceHandle, ResourceRegistry};
pub use wav::{WavEncoder, encode_wav};

use crate::core::DecodedBuffer;
use crate::error::AudioResult;

/// Trait for audio encoders
pub trait Encoder {
    /// Serialize a whole buffer into a complete file image
    fn encode(&self, buffer: &DecodedBuffer) -> AudioResult<Vec<u8>>;
}
