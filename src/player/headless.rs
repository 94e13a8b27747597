//! Renderer without an output device

use super::renderer::{EventSink, Renderer, RendererEvent, RendererFactory, RendererStyle};
use super::waveform;
use crate::core::TrackRole;
use crate::decoder::decode_bytes;
use crate::encoder::{ResourceHandle, ResourceRegistry};
use crate::error::{AudioError, AudioResult};
use log::debug;
use std::time::Duration;

/// Renderer without audio output: keeps a simulated playhead driven by `tick`
#[derive(Debug)]
pub struct HeadlessRenderer {
    role: TrackRole,
    duration: f64,
    position: f64,
    playing: bool,
    destroyed: bool,
    peaks: Vec<f32>,
    events: EventSink,
}

impl HeadlessRenderer {
    /// Load the WAV behind `handle` and prepare its waveform
    pub fn load(
        registry: &ResourceRegistry,
        role: TrackRole,
        handle: &ResourceHandle,
        style: &RendererStyle,
        events: EventSink,
    ) -> AudioResult<Self> {
        let bytes = registry
            .resolve(handle.url())
            .ok_or_else(|| AudioError::Renderer(format!("{} has been revoked", handle.url())))?;
        let buffer = decode_bytes(bytes, Some("wav"))
            .map_err(|e| AudioError::Renderer(format!("cannot load {}: {e}", handle.url())))?;

        let duration = buffer.duration().as_secs_f64();
        let bins = (duration * f64::from(style.min_px_per_sec)).ceil() as usize;
        let peaks = buffer
            .channel(0)
            .map(|samples| waveform::peaks(samples, bins.max(1), style.normalize))
            .unwrap_or_default();

        debug!("Bound {} renderer: {:.3}s, {} peaks", role, duration, peaks.len());

        Ok(HeadlessRenderer {
            role,
            duration,
            position: 0.0,
            playing: false,
            destroyed: false,
            peaks,
            events,
        })
    }

    /// Track this renderer draws
    pub fn role(&self) -> TrackRole {
        self.role
    }
}

impl Renderer for HeadlessRenderer {
    fn play(&mut self) -> AudioResult<()> {
        if self.destroyed {
            return Err(AudioError::Renderer("renderer destroyed".to_string()));
        }
        if !self.playing {
            self.playing = true;
            self.events.emit(RendererEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.events.emit(RendererEvent::Pause);
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if !self.destroyed {
            self.position = seconds.clamp(0.0, self.duration);
        }
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    fn tick(&mut self, elapsed: Duration) {
        if !self.playing {
            return;
        }
        self.position += elapsed.as_secs_f64();
        if self.position >= self.duration {
            self.position = self.duration;
            self.playing = false;
            self.events.emit(RendererEvent::Finish);
        }
    }

    fn destroy(&mut self) {
        self.playing = false;
        self.destroyed = true;
        self.peaks = Vec::new();
    }
}

/// Builds [`HeadlessRenderer`]s from a registry
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    registry: ResourceRegistry,
}

impl HeadlessFactory {
    /// Resolve handles through `registry`
    pub fn new(registry: ResourceRegistry) -> Self {
        HeadlessFactory { registry }
    }
}

impl RendererFactory for HeadlessFactory {
    fn create(
        &self,
        role: TrackRole,
        handle: &ResourceHandle,
        style: &RendererStyle,
        events: EventSink,
    ) -> AudioResult<Box<dyn Renderer>> {
        let renderer = HeadlessRenderer::load(&self.registry, role, handle, style, events)?;
        Ok(Box::new(renderer))
    }
}
