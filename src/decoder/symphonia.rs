//! Symphonia-based decoder for in-memory files

use crate::core::DecodedBuffer;
use crate::error::{AudioError, AudioResult};
use bytes::Bytes;
use log::debug;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Symphonia-based audio decoder over an in-memory file
pub struct SymphoniaDecoder {
    /// Container reader for the audio source
    reader: Box<dyn FormatReader>,
    /// Track being decoded
    track_id: u32,
    /// Sample rate
    sample_rate: u32,
    /// Codec state
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    /// Reusable interleaved conversion buffer
    sample_buf: Option<SampleBuffer<f32>>,
    /// Whether decoding is finished
    finished: bool,
}

impl SymphoniaDecoder {
    /// Probe the bytes and prepare a decoder for the first audio track
    pub fn from_bytes(bytes: Bytes, hint: Option<&str>) -> AudioResult<Self> {
        if bytes.is_empty() {
            return Err(AudioError::Decode("Empty input".to_string()));
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut probe_hint = Hint::new();
        if let Some(ext) = hint {
            probe_hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &probe_hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::InvalidMetadata("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::InvalidMetadata("Unknown sample rate".to_string()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        debug!(
            "Probed track {}: {} Hz, {:?} channels",
            track_id,
            sample_rate,
            codec_params.channels.map(|c| c.count())
        );

        Ok(SymphoniaDecoder {
            reader,
            track_id,
            sample_rate,
            decoder,
            sample_buf: None,
            finished: false,
        })
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl super::Decoder for SymphoniaDecoder {
    fn decode_chunk(&mut self) -> AudioResult<Option<DecodedBuffer>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A corrupt packet is skipped, the rest of the stream may still decode
                Err(SymphoniaError::DecodeError(msg)) => {
                    debug!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let frames = decoded.capacity();
            let channel_count = spec.channels.count();

            let sbuf = self
                .sample_buf
                .get_or_insert_with(|| SampleBuffer::<f32>::new(frames as u64, spec));
            if sbuf.capacity() < frames * channel_count {
                *sbuf = SampleBuffer::<f32>::new(frames as u64, spec);
            }

            sbuf.copy_interleaved_ref(decoded);
            let samples = sbuf.samples();

            if samples.is_empty() {
                continue;
            }

            let chunk = DecodedBuffer::from_interleaved(samples, channel_count, spec.rate)?;
            return Ok(Some(chunk));
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{Decoder, decode_bytes};

    fn wav_bytes(channels: u16, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_empty_input() {
        let result = SymphoniaDecoder::from_bytes(Bytes::new(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_input() {
        let result = decode_bytes(vec![0x42u8; 512], Some("wav"));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_stereo_deinterleaves() {
        let bytes = wav_bytes(2, &[16384, -16384, 8192, -8192, 0, 0]);
        let buffer = decode_bytes(bytes, Some("wav")).unwrap();

        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 3);
        assert!((buffer.channel(0).unwrap()[0] - 0.5).abs() < 1e-4);
        assert!((buffer.channel(1).unwrap()[1] + 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_decoder_reports_finished() {
        let bytes = wav_bytes(1, &[1000; 64]);
        let mut decoder = SymphoniaDecoder::from_bytes(Bytes::from(bytes), None).unwrap();
        while decoder.decode_chunk().unwrap().is_some() {}
        assert!(decoder.is_finished());
        assert!(decoder.decode_chunk().unwrap().is_none());
    }
}
