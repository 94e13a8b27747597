//! Dual-track comparison playback

pub mod controller;
pub mod headless;
pub mod pipeline;
pub mod renderer;
pub mod track;
pub mod waveform;

pub use controller::{
    ControllerEvent, DualTrackController, LoadOutcome, SessionSnapshot, TrackSnapshot,
};
pub use headless::{HeadlessFactory, HeadlessRenderer};
pub use pipeline::{PreparedTrack, TrackPipeline};
pub use renderer::{EventSink, Renderer, RendererEvent, RendererFactory, RendererStyle, TrackEvent};
pub use track::{FailureKind, TrackFailure, TrackState};
