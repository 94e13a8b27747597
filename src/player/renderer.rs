//! Renderer seam between the controller and a waveform view

use crate::core::TrackRole;
use crate::encoder::ResourceHandle;
use crate::error::AudioResult;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Transport notification raised by a renderer
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// Playback started
    Play,
    /// Playback paused
    Pause,
    /// Playback reached the end
    Finish,
    /// Playback or drawing failed
    Error(String),
}

/// A renderer event tagged with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    /// Track whose renderer raised the event
    pub role: TrackRole,
    /// Load generation the renderer belongs to
    pub generation: u64,
    /// What happened
    pub event: RendererEvent,
}

/// Sending half handed to every renderer
#[derive(Debug, Clone)]
pub struct EventSink {
    role: TrackRole,
    generation: u64,
    tx: UnboundedSender<TrackEvent>,
}

impl EventSink {
    /// Create a sink for one renderer binding
    pub fn new(role: TrackRole, generation: u64, tx: UnboundedSender<TrackEvent>) -> Self {
        EventSink {
            role,
            generation,
            tx,
        }
    }

    /// Report an event; dropped silently once the controller is gone
    pub fn emit(&self, event: RendererEvent) {
        let _ = self.tx.send(TrackEvent {
            role: self.role,
            generation: self.generation,
            event,
        });
    }
}

/// Visual options of a waveform binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererStyle {
    /// Colour of the unplayed waveform
    pub wave_color: String,
    /// Colour of the played part
    pub progress_color: String,
    /// Height in pixels
    pub height: u32,
    /// Scale peaks so the loudest reaches full height
    pub normalize: bool,
    /// Horizontal zoom
    pub min_px_per_sec: u32,
}

impl RendererStyle {
    /// Grey for the reference, blue for the user
    pub fn for_role(role: TrackRole) -> Self {
        let (wave_color, progress_color) = match role {
            TrackRole::Reference => ("rgb(145, 145, 145)", "rgba(255, 255, 255, 0.9)"),
            TrackRole::User => ("rgba(121, 172, 253, 0.7)", "rgba(41, 111, 224, 0.9)"),
        };
        RendererStyle {
            wave_color: wave_color.to_string(),
            progress_color: progress_color.to_string(),
            height: 150,
            normalize: true,
            min_px_per_sec: 50,
        }
    }
}

/// Waveform view with transport controls for one track
pub trait Renderer: Send {
    /// Start or resume playback
    fn play(&mut self) -> AudioResult<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Move the playhead, clamped to the track
    fn seek_to(&mut self, seconds: f64);

    /// Playhead position in seconds
    fn position(&self) -> f64;

    /// Track length in seconds
    fn duration(&self) -> f64;

    /// Whether the playhead is advancing
    fn is_playing(&self) -> bool;

    /// Peak envelope used for drawing
    fn peaks(&self) -> &[f32];

    /// Advance an externally clocked renderer
    fn tick(&mut self, _elapsed: Duration) {}

    /// Stop and release everything; later calls do nothing
    fn destroy(&mut self);
}

/// Builds renderer bindings for loaded tracks
pub trait RendererFactory: Send + Sync {
    /// Bind a renderer to the resource behind `handle`
    fn create(
        &self,
        role: TrackRole,
        handle: &ResourceHandle,
        style: &RendererStyle,
        events: EventSink,
    ) -> AudioResult<Box<dyn Renderer>>;
}
