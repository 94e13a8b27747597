use std::io;
use thiserror::Error;

use crate::core::TrackRole;

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Error types for the comparison pipeline
#[derive(Error, Debug)]
pub enum AudioError {
    /// IO error (file operations, disk access)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Network or HTTP failure while retrieving a source
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// URL that was requested
        url: String,
        /// HTTP status when the server answered
        status: Option<u16>,
        /// Human readable cause
        reason: String,
    },

    /// Unsupported audio container or codec
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Invalid audio metadata
    #[error("Invalid audio metadata: {0}")]
    InvalidMetadata(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Playback or visualization failure
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Transport command on a track that is not loaded
    #[error("Track {role} is not available")]
    TrackUnavailable {
        /// Track the command was addressed to
        role: TrackRole,
    },

    /// Invalid channel configuration
    #[error("Invalid channel configuration: expected {expected}, got {got}")]
    InvalidChannels {
        /// Expected number of channels
        expected: usize,
        /// Got number of channels
        got: usize,
    },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate
        rate: u32,
    },

    /// Buffer-related error
    #[error("Buffer error: {0}")]
    Buffer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AudioError {
    /// Build a fetch error without an HTTP status
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        AudioError::Fetch {
            url: url.into(),
            status: None,
            reason: reason.to_string(),
        }
    }

    /// Whether the error aborts only the track it happened on
    pub fn is_track_scoped(&self) -> bool {
        matches!(
            self,
            AudioError::Fetch { .. }
                | AudioError::Decode(_)
                | AudioError::UnsupportedFormat(_)
                | AudioError::InvalidMetadata(_)
                | AudioError::Encode(_)
                | AudioError::Renderer(_)
        )
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;
        match err {
            SymphoniaError::Unsupported(what) => AudioError::UnsupportedFormat(what.to_string()),
            e => AudioError::Decode(e.to_string()),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::Io(e),
            e => AudioError::Encode(e.to_string()),
        }
    }
}
