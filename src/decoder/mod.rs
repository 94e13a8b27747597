//! Audio decoder implementations

pub mod symphonia;

pub use symphonia::SymphoniaDecoder;

use crate::core::DecodedBuffer;
use crate::error::{AudioError, AudioResult};
use bytes::Bytes;

/// Trait for audio decoders
pub trait Decoder: Send {
    /// Get the next chunk of decoded audio from the stream
    fn decode_chunk(&mut self) -> AudioResult<Option<DecodedBuffer>>;

    /// Check if decoder is finished
    fn is_finished(&self) -> bool;
}

/// Decode a complete in-memory file into one PCM buffer.
///
/// `hint` is an optional file extension that helps the format probe.
pub fn decode_bytes(bytes: impl Into<Bytes>, hint: Option<&str>) -> AudioResult<DecodedBuffer> {
    let mut decoder = SymphoniaDecoder::from_bytes(bytes.into(), hint)?;
    drain(&mut decoder)
}

/// Pull every chunk out of a decoder and join them
pub fn drain(decoder: &mut dyn Decoder) -> AudioResult<DecodedBuffer> {
    let mut output: Option<DecodedBuffer> = None;

    while let Some(chunk) = decoder.decode_chunk()? {
        match output.as_mut() {
            Some(buffer) => buffer.append(&chunk)?,
            None => output = Some(chunk),
        }
    }

    match output {
        Some(buffer) if !buffer.is_empty() => Ok(buffer),
        _ => Err(AudioError::Decode("Stream contains no audio".to_string())),
    }
}
