//! WAV encoding via hound

use crate::core::{BitDepth, DecodedBuffer};
use crate::error::{AudioError, AudioResult};
use hound::{WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// WAV audio encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder {
    bit_depth: BitDepth,
}

impl WavEncoder {
    /// Create an encoder writing samples at the given depth
    pub fn new(bit_depth: BitDepth) -> Self {
        WavEncoder { bit_depth }
    }

    /// Get the bit depth
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    fn spec_for(&self, buffer: &DecodedBuffer) -> AudioResult<WavSpec> {
        let channels = u16::try_from(buffer.channel_count()).map_err(|_| {
            AudioError::Encode(format!("Too many channels: {}", buffer.channel_count()))
        })?;

        Ok(WavSpec {
            channels,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: self.bit_depth.bits(),
            sample_format: if self.bit_depth.is_float() {
                hound::SampleFormat::Float
            } else {
                hound::SampleFormat::Int
            },
        })
    }

    /// Write a buffer into any seekable sink
    pub fn write_to<W: Write + Seek>(&self, buffer: &DecodedBuffer, sink: W) -> AudioResult<()> {
        let spec = self.spec_for(buffer)?;
        let writer = WavWriter::new(sink, spec)?;
        self.write_samples(writer, buffer)
    }

    /// Write a buffer to a file on disk
    pub fn write_file<P: AsRef<Path>>(&self, path: P, buffer: &DecodedBuffer) -> AudioResult<()> {
        let spec = self.spec_for(buffer)?;
        let writer = WavWriter::create(path, spec)?;
        self.write_samples(writer, buffer)
    }

    fn write_samples<W: Write + Seek>(
        &self,
        mut writer: WavWriter<W>,
        buffer: &DecodedBuffer,
    ) -> AudioResult<()> {
        match self.bit_depth {
            BitDepth::F32 => {
                for sample in buffer.interleaved() {
                    writer.write_sample(sample)?;
                }
            }
            BitDepth::I16 => {
                for sample in buffer.interleaved() {
                    writer.write_sample(quantize(sample, 16) as i16)?;
                }
            }
            BitDepth::I24 | BitDepth::I32 => {
                let bits = self.bit_depth.bits();
                for sample in buffer.interleaved() {
                    writer.write_sample(quantize(sample, bits) as i32)?;
                }
            }
        }

        writer.finalize()?;
        Ok(())
    }
}

/// Scale a float sample to a signed integer of `bits` width.
///
/// Full scale is `2^(bits-1)`, clamped to the representable range.
fn quantize(sample: f32, bits: u16) -> i64 {
    let full_scale = (1i64 << (bits - 1)) as f64;
    let scaled = (f64::from(sample.clamp(-1.0, 1.0)) * full_scale).round();
    (scaled as i64).clamp(-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
}

impl super::Encoder for WavEncoder {
    fn encode(&self, buffer: &DecodedBuffer) -> AudioResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(buffer, &mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Serialize a buffer to an in-memory WAV file
pub fn encode_wav(buffer: &DecodedBuffer, bit_depth: BitDepth) -> AudioResult<Vec<u8>> {
    use super::Encoder;
    WavEncoder::new(bit_depth).encode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_bytes;
    use tempfile::NamedTempFile;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (i as f32 / frames as f32) * 1.6 - 0.8)
            .collect()
    }

    #[test]
    fn test_header_layout() {
        let buffer = DecodedBuffer::silent(2, 10, 16000).unwrap();
        let bytes = encode_wav(&buffer, BitDepth::I16).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        // 44 byte canonical header + 10 frames * 2 channels * 2 bytes
        assert_eq!(bytes.len(), 44 + 40);
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(1.0, 16), 32767);
        assert_eq!(quantize(-1.0, 16), -32768);
        assert_eq!(quantize(2.0, 16), 32767);
        assert_eq!(quantize(0.5, 16), 16384);
        assert_eq!(quantize(-1.0, 24), -8_388_608);
    }

    #[test]
    fn test_round_trip_16_bit_within_quantization() {
        let left = ramp(4000);
        let right: Vec<f32> = left.iter().map(|s| -s * 0.5).collect();
        let buffer = DecodedBuffer::new(vec![left, right], 16000).unwrap();

        let bytes = encode_wav(&buffer, BitDepth::I16).unwrap();
        let decoded = decode_bytes(bytes, Some("wav")).unwrap();

        assert_eq!(decoded.sample_rate(), 16000);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), 4000);

        let tolerance = 1.0 / 32768.0;
        for (original, restored) in buffer.interleaved().zip(decoded.interleaved()) {
            assert!((original - restored).abs() <= tolerance);
        }
    }

    #[test]
    fn test_round_trip_float_is_exact() {
        let buffer = DecodedBuffer::new(vec![ramp(512)], 22050).unwrap();
        let bytes = encode_wav(&buffer, BitDepth::F32).unwrap();
        let decoded = decode_bytes(bytes, Some("wav")).unwrap();
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn test_write_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let buffer = DecodedBuffer::new(vec![ramp(100)], 8000).unwrap();

        WavEncoder::new(BitDepth::I24)
            .write_file(temp_file.path(), &buffer)
            .unwrap();

        let reader = hound::WavReader::open(temp_file.path()).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
        assert_eq!(reader.duration(), 100);
    }
}
