use crate::error::{AudioError, AudioResult};
use std::time::Duration;

/// Bit depth for encoded WAV samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 16-bit signed (-32768 to 32767)
    #[default]
    I16,
    /// 24-bit signed
    I24,
    /// 32-bit signed
    I32,
    /// 32-bit floating point
    F32,
}

impl BitDepth {
    /// Parse a bit depth from its bit count (32 selects float)
    pub fn from_bits(bits: u16) -> AudioResult<Self> {
        match bits {
            16 => Ok(BitDepth::I16),
            24 => Ok(BitDepth::I24),
            32 => Ok(BitDepth::F32),
            n => Err(AudioError::Config(format!(
                "Unsupported bit depth {n}, expected 16, 24 or 32"
            ))),
        }
    }

    /// Bits per sample as written in the WAV header
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::I16 => 16,
            BitDepth::I24 => 24,
            BitDepth::I32 | BitDepth::F32 => 32,
        }
    }

    /// Get bytes per sample
    pub fn bytes_per_sample(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Whether samples are stored as IEEE floats
    pub fn is_float(&self) -> bool {
        matches!(self, BitDepth::F32)
    }
}

/// Planar PCM audio held in memory at its source sample rate.
///
/// Every channel has the same number of samples; `frame_count` is that
/// shared length.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    /// One sample vector per channel, f32 from -1.0 to 1.0
    channels: Vec<Vec<f32>>,
    /// Sample rate in Hz (e.g., 44100, 48000, 16000)
    sample_rate: u32,
}

impl DecodedBuffer {
    /// Create a buffer from planar channel data
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }

        if channels.is_empty() {
            return Err(AudioError::Buffer("Buffer has no channels".to_string()));
        }

        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(AudioError::Buffer(
                "Channels have different lengths".to_string(),
            ));
        }

        Ok(DecodedBuffer {
            channels,
            sample_rate,
        })
    }

    /// Create a buffer from interleaved samples
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> AudioResult<Self> {
        if channel_count == 0 {
            return Err(AudioError::InvalidChannels {
                expected: 1,
                got: 0,
            });
        }
        if samples.len() % channel_count != 0 {
            return Err(AudioError::Buffer(
                "Sample count not divisible by channel count".to_string(),
            ));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// An all-zero buffer
    pub fn silent(channel_count: usize, frames: usize, sample_rate: u32) -> AudioResult<Self> {
        Self::new(vec![vec![0.0; frames]; channel_count.max(1)], sample_rate)
    }

    /// Get sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels, planar
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Check if buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Copy the sample range `[start, end)` of every channel into a new buffer
    pub fn slice(&self, start: usize, end: usize) -> AudioResult<Self> {
        if start > end || end > self.frame_count() {
            return Err(AudioError::Buffer(format!(
                "Range {start}..{end} out of bounds for {} frames",
                self.frame_count()
            )));
        }

        let channels = self
            .channels
            .iter()
            .map(|c| c[start..end].to_vec())
            .collect();

        Ok(DecodedBuffer {
            channels,
            sample_rate: self.sample_rate,
        })
    }

    /// Append another buffer with the same layout
    pub fn append(&mut self, other: &DecodedBuffer) -> AudioResult<()> {
        if other.sample_rate != self.sample_rate {
            return Err(AudioError::InvalidSampleRate {
                rate: other.sample_rate,
            });
        }
        if other.channel_count() != self.channel_count() {
            return Err(AudioError::InvalidChannels {
                expected: self.channel_count(),
                got: other.channel_count(),
            });
        }

        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            dst.extend_from_slice(src);
        }
        Ok(())
    }

    /// Iterate samples frame by frame, channels interleaved
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.frame_count()).flat_map(move |i| self.channels.iter().map(move |c| c[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depth_from_bits() {
        assert_eq!(BitDepth::from_bits(16).unwrap(), BitDepth::I16);
        assert_eq!(BitDepth::from_bits(32).unwrap(), BitDepth::F32);
        assert!(BitDepth::from_bits(8).is_err());
        assert_eq!(BitDepth::I24.bytes_per_sample(), 3);
    }

    #[test]
    fn test_buffer_creation() {
        let buffer = DecodedBuffer::new(vec![vec![0.1, 0.2], vec![0.3, 0.4]], 44100).unwrap();

        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
    }

    #[test]
    fn test_buffer_rejects_ragged_channels() {
        let result = DecodedBuffer::new(vec![vec![0.1, 0.2], vec![0.3]], 44100);
        assert!(result.is_err());
        assert!(DecodedBuffer::new(vec![vec![0.0]], 0).is_err());
    }

    #[test]
    fn test_from_interleaved() {
        let buffer = DecodedBuffer::from_interleaved(&[0.0, 1.0, 0.5, -0.5], 2, 8000).unwrap();
        assert_eq!(buffer.channel(0).unwrap(), &[0.0, 0.5]);
        assert_eq!(buffer.channel(1).unwrap(), &[1.0, -0.5]);
        assert_eq!(buffer.interleaved().collect::<Vec<_>>(), vec![0.0, 1.0, 0.5, -0.5]);

        assert!(DecodedBuffer::from_interleaved(&[0.0, 1.0, 0.5], 2, 8000).is_err());
    }

    #[test]
    fn test_slice_copies_every_channel() {
        let buffer =
            DecodedBuffer::new(vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]], 8000)
                .unwrap();
        let sliced = buffer.slice(1, 3).unwrap();

        assert_eq!(sliced.channel(0).unwrap(), &[2.0, 3.0]);
        assert_eq!(sliced.channel(1).unwrap(), &[6.0, 7.0]);
        assert!(buffer.slice(3, 5).is_err());
    }

    #[test]
    fn test_append() {
        let mut a = DecodedBuffer::new(vec![vec![1.0]], 8000).unwrap();
        let b = DecodedBuffer::new(vec![vec![2.0, 3.0]], 8000).unwrap();
        a.append(&b).unwrap();
        assert_eq!(a.frame_count(), 3);

        let stereo = DecodedBuffer::silent(2, 4, 8000).unwrap();
        assert!(a.append(&stereo).is_err());
    }

    #[test]
    fn test_duration() {
        let buffer = DecodedBuffer::silent(1, 16000, 16000).unwrap();
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }
}
