//! Core audio types and structures

/// PCM buffer and sample format types
pub mod audio;
/// Comparison sources and track roles
pub mod source;

pub use audio::{BitDepth, DecodedBuffer};
pub use source::{AudioSource, TrackRole, extension_hint};
