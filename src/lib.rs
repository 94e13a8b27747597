#![warn(missing_docs)]

//! # voice-compare: trimmed A/B playback of a reference voice and a recording
//!
//! Both clips are fetched, decoded, stripped of leading and trailing
//! near-silence, re-encoded as WAV and handed to a two-track player that lets
//! the listener flip between "reference" and "my voice".
//!
//! ## Features
//!
//! - **Fetch** - HTTP with same-origin proxy rewriting, or local files
//! - **Decode** - MP3, FLAC, WAV, OGG, AAC via symphonia
//! - **Trim** - frame RMS against a threshold relative to the clip's peak
//! - **Encode** - in-memory WAV published under a revocable `blob:` URL
//! - **Play** - dual-track controller with exclusive playback
//! - **Proxy** - `GET /audio-proxy` server
//!
//! ## Quick Start
//!
//! ```ignore
//! use voice_compare::filter::{SilenceTrimmer, TrimParams};
//! use voice_compare::{BitDepth, decoder, encoder};
//!
//! let buffer = decoder::decode_bytes(std::fs::read("take.wav")?, Some("wav"))?;
//! let (trimmed, bounds) = SilenceTrimmer::new(TrimParams::new(20.0))?.trim(&buffer)?;
//! let wav = encoder::encode_wav(&trimmed, BitDepth::I16)?;
//! ```

/// Core audio types and structures
pub mod core;
/// Environment configuration
pub mod config;
/// Error types for audio operations
pub mod error;
/// Audio source retrieval
pub mod fetch;
/// Audio decoder implementations
pub mod decoder;
/// Audio filter implementations
pub mod filter;
/// Audio encoder implementations
pub mod encoder;
/// Dual-track comparison player
pub mod player;
/// Audio proxy HTTP server
pub mod server;

pub use core::{AudioSource, BitDepth, DecodedBuffer, TrackRole};
pub use error::{AudioError, AudioResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
