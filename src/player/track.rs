//! Per-track state

use super::renderer::Renderer;
use crate::core::TrackRole;
use crate::encoder::EncodedAsset;
use crate::error::{AudioError, AudioResult};
use crate::filter::TrimBounds;
use std::fmt;

/// What went wrong with a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Network or HTTP failure, with the status when the server answered
    Fetch {
        /// HTTP status
        status: Option<u16>,
    },
    /// Bytes could not be decoded
    Decode,
    /// Trimmed audio could not be encoded
    Encode,
    /// Playback or drawing failed
    Renderer,
    /// Anything else
    Other,
}

/// Why a track ended up `Failed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFailure {
    /// Category
    pub kind: FailureKind,
    /// Message for display
    pub message: String,
}

impl From<&AudioError> for TrackFailure {
    fn from(err: &AudioError) -> Self {
        let kind = match err {
            AudioError::Fetch { status, .. } => FailureKind::Fetch { status: *status },
            AudioError::Decode(_)
            | AudioError::UnsupportedFormat(_)
            | AudioError::InvalidMetadata(_) => FailureKind::Decode,
            AudioError::Encode(_) => FailureKind::Encode,
            AudioError::Renderer(_) => FailureKind::Renderer,
            _ => FailureKind::Other,
        };
        TrackFailure {
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for TrackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Lifecycle of one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackState {
    /// Nothing requested
    Unloaded,
    /// Pipeline running
    Loading,
    /// Bound and idle at the start
    Ready,
    /// Playhead advancing
    Playing,
    /// Stopped mid-track
    Paused,
    /// Stopped at the end
    Finished,
    /// Unusable until the next load
    Failed(TrackFailure),
}

impl TrackState {
    /// Whether transport commands are accepted
    pub fn is_loaded(&self) -> bool {
        matches!(
            self,
            TrackState::Ready | TrackState::Playing | TrackState::Paused | TrackState::Finished
        )
    }
}

/// One side of the comparison: its resource, renderer and state
pub(crate) struct TrackPlayer {
    pub(crate) role: TrackRole,
    pub(crate) label: String,
    pub(crate) state: TrackState,
    pub(crate) asset: Option<EncodedAsset>,
    pub(crate) bounds: Option<TrimBounds>,
    renderer: Option<Box<dyn Renderer>>,
}

impl TrackPlayer {
    pub(crate) fn new(role: TrackRole) -> Self {
        TrackPlayer {
            role,
            label: role.name().to_string(),
            state: TrackState::Unloaded,
            asset: None,
            bounds: None,
            renderer: None,
        }
    }

    pub(crate) fn bind(
        &mut self,
        asset: EncodedAsset,
        bounds: TrimBounds,
        renderer: Box<dyn Renderer>,
    ) {
        self.release();
        self.asset = Some(asset);
        self.bounds = Some(bounds);
        self.renderer = Some(renderer);
        self.state = TrackState::Ready;
    }

    /// Destroy the renderer and revoke the resource; safe to repeat
    pub(crate) fn release(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        if let Some(asset) = self.asset.take() {
            asset.revoke();
        }
        self.bounds = None;
        self.state = TrackState::Unloaded;
    }

    pub(crate) fn fail(&mut self, failure: TrackFailure) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.pause();
        }
        self.state = TrackState::Failed(failure);
    }

    pub(crate) fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    fn active(&mut self) -> Option<&mut Box<dyn Renderer>> {
        if !self.state.is_loaded() {
            return None;
        }
        self.renderer.as_mut()
    }

    fn require_active(&mut self) -> AudioResult<&mut Box<dyn Renderer>> {
        let role = self.role;
        self.active().ok_or(AudioError::TrackUnavailable { role })
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.state.is_loaded() && self.renderer.as_ref().is_some_and(|r| r.is_playing())
    }

    pub(crate) fn play(&mut self) -> AudioResult<()> {
        let renderer = self.require_active()?;
        if renderer.position() >= renderer.duration() {
            renderer.seek_to(0.0);
        }
        renderer.play()?;
        self.state = TrackState::Playing;
        Ok(())
    }

    pub(crate) fn pause(&mut self) {
        if let Some(renderer) = self.active() {
            let was_playing = renderer.is_playing();
            renderer.pause();
            if was_playing {
                self.state = TrackState::Paused;
            }
        }
    }

    /// Stop and move back to the start
    pub(crate) fn rewind(&mut self) {
        if let Some(renderer) = self.active() {
            renderer.pause();
            renderer.seek_to(0.0);
            self.state = TrackState::Ready;
        }
    }

    pub(crate) fn seek(&mut self, seconds: f64) -> AudioResult<f64> {
        let renderer = self.require_active()?;
        renderer.seek_to(seconds);
        let position = renderer.position();
        let at_end = position >= renderer.duration();
        let playing = renderer.is_playing();
        if self.state == TrackState::Finished && !at_end {
            self.state = TrackState::Paused;
        } else if !playing && at_end {
            self.state = TrackState::Finished;
        }
        Ok(position)
    }

    pub(crate) fn tick(&mut self, elapsed: std::time::Duration) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.tick(elapsed);
        }
    }

    pub(crate) fn position(&self) -> f64 {
        self.renderer.as_ref().map_or(0.0, |r| r.position())
    }

    pub(crate) fn duration(&self) -> f64 {
        self.renderer.as_ref().map_or(0.0, |r| r.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_from_fetch_error() {
        let err = AudioError::Fetch {
            url: "https://x/a.wav".to_string(),
            status: Some(404),
            reason: "HTTP 404".to_string(),
        };
        let failure = TrackFailure::from(&err);
        assert_eq!(failure.kind, FailureKind::Fetch { status: Some(404) });
    }

    #[test]
    fn test_failure_from_decode_error() {
        let failure = TrackFailure::from(&AudioError::UnsupportedFormat("ogg".to_string()));
        assert_eq!(failure.kind, FailureKind::Decode);
    }

    #[test]
    fn test_unloaded_track_refuses_transport() {
        let mut track = TrackPlayer::new(TrackRole::User);
        assert!(matches!(
            track.play(),
            Err(AudioError::TrackUnavailable {
                role: TrackRole::User
            })
        ));
        track.pause();
        track.release();
        track.release();
        assert_eq!(track.state, TrackState::Unloaded);
    }
}
