//! Two-track comparison player.
//!
//! The controller owns the reference and user tracks, runs their load
//! pipelines side by side and arbitrates transport so that only one track
//! ever plays. Every load bumps a generation counter; results and renderer
//! events carrying an older generation are discarded.

use super::headless::HeadlessFactory;
use super::pipeline::{PreparedTrack, TrackPipeline};
use super::renderer::{EventSink, RendererEvent, RendererFactory, RendererStyle, TrackEvent};
use super::track::{FailureKind, TrackFailure, TrackPlayer, TrackState};
use crate::core::{AudioSource, TrackRole};
use crate::error::AudioResult;
use crate::filter::TrimBounds;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

const NOTICE_CAPACITY: usize = 64;

/// Notification for whoever draws the comparison
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Both pipelines of a load settled
    PairLoaded {
        /// Generation that completed
        generation: u64,
    },
    /// A track could not be loaded
    TrackFailed {
        /// Affected track
        role: TrackRole,
        /// Cause
        failure: TrackFailure,
    },
    /// A loaded track failed during playback
    PlaybackFailed {
        /// Affected track
        role: TrackRole,
        /// Cause
        failure: TrackFailure,
    },
    /// The selected version changed and both tracks were rewound
    VersionChanged(TrackRole),
    /// A track started or stopped
    PlayStateChanged {
        /// Affected track
        role: TrackRole,
        /// Whether it is now playing
        playing: bool,
    },
}

/// Result of [`DualTrackController::load_pair`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The load is current; per-track result
    Loaded {
        /// Reference track state
        reference: TrackState,
        /// User track state
        user: TrackState,
    },
    /// A newer load started before this one settled
    Superseded,
}

/// Point-in-time view of one track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    /// Side of the comparison
    pub role: TrackRole,
    /// Display label
    pub label: String,
    /// Lifecycle state
    pub state: TrackState,
    /// Whether the renderer is advancing
    pub playing: bool,
    /// Playhead in seconds
    pub position: f64,
    /// Trimmed length in seconds
    pub duration: f64,
    /// URL of the published trimmed audio
    pub resource_url: Option<String>,
    /// Range kept by the trimmer
    pub bounds: Option<TrimBounds>,
    /// Waveform envelope
    pub peaks: Vec<f32>,
}

/// Point-in-time view of the whole comparison
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Current load generation
    pub generation: u64,
    /// Track the transport acts on
    pub selected: TrackRole,
    /// Whether the selected track is playing
    pub is_playing: bool,
    /// Reference track
    pub reference: TrackSnapshot,
    /// User track
    pub user: TrackSnapshot,
}

impl SessionSnapshot {
    /// View of one track
    pub fn track(&self, role: TrackRole) -> &TrackSnapshot {
        match role {
            TrackRole::Reference => &self.reference,
            TrackRole::User => &self.user,
        }
    }
}

struct Session {
    generation: u64,
    selected: TrackRole,
    reference: TrackPlayer,
    user: TrackPlayer,
}

impl Session {
    fn track(&self, role: TrackRole) -> &TrackPlayer {
        match role {
            TrackRole::Reference => &self.reference,
            TrackRole::User => &self.user,
        }
    }

    fn track_mut(&mut self, role: TrackRole) -> &mut TrackPlayer {
        match role {
            TrackRole::Reference => &mut self.reference,
            TrackRole::User => &mut self.user,
        }
    }

    fn release_all(&mut self) {
        self.reference.release();
        self.user.release();
    }

    fn snapshot_track(&self, role: TrackRole) -> TrackSnapshot {
        let track = self.track(role);
        TrackSnapshot {
            role,
            label: track.label.clone(),
            state: track.state.clone(),
            playing: track.is_playing(),
            position: track.position(),
            duration: track.duration(),
            resource_url: track.asset.as_ref().map(|a| a.handle.url().to_string()),
            bounds: track.bounds,
            peaks: track
                .renderer()
                .map(|r| r.peaks().to_vec())
                .unwrap_or_default(),
        }
    }
}

/// Owns both tracks and enforces exclusive playback
pub struct DualTrackController {
    pipeline: TrackPipeline,
    factory: Arc<dyn RendererFactory>,
    session: Mutex<Session>,
    events_tx: UnboundedSender<TrackEvent>,
    events_rx: Mutex<UnboundedReceiver<TrackEvent>>,
    notices: broadcast::Sender<ControllerEvent>,
}

impl DualTrackController {
    /// Create a controller binding tracks through `factory`
    pub fn new(pipeline: TrackPipeline, factory: Arc<dyn RendererFactory>) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        DualTrackController {
            pipeline,
            factory,
            session: Mutex::new(Session {
                generation: 0,
                selected: TrackRole::Reference,
                reference: TrackPlayer::new(TrackRole::Reference),
                user: TrackPlayer::new(TrackRole::User),
            }),
            events_tx,
            events_rx: Mutex::new(events_rx),
            notices,
        }
    }

    /// Create a controller with headless renderers on the pipeline's registry
    pub fn headless(pipeline: TrackPipeline) -> Self {
        let factory = HeadlessFactory::new(pipeline.registry().clone());
        Self::new(pipeline, Arc::new(factory))
    }

    /// Receive notifications from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.notices.subscribe()
    }

    fn notify(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.notices.send(event);
    }

    /// Replace both tracks with freshly processed sources.
    ///
    /// Previous renderers are destroyed and their resources revoked before
    /// the new pipelines start. Renderers are bound only once both pipelines
    /// have settled; a failed track does not hold back its sibling.
    pub async fn load_pair(&self, reference: AudioSource, user: AudioSource) -> LoadOutcome {
        let generation = {
            let mut session = self.session.lock();
            session.generation += 1;
            session.selected = TrackRole::Reference;
            session.release_all();
            session.reference.label = reference.label.clone();
            session.user.label = user.label.clone();
            session.reference.state = TrackState::Loading;
            session.user.state = TrackState::Loading;
            session.generation
        };
        info!(
            "Loading pair #{}: {} | {}",
            generation, reference.url, user.url
        );

        let (reference_result, user_result) = tokio::join!(
            self.pipeline.prepare(&reference),
            self.pipeline.prepare(&user)
        );

        let mut notices = Vec::new();
        let outcome = {
            let mut session = self.session.lock();
            if session.generation != generation {
                debug!(
                    "Discarding load #{} superseded by #{}",
                    generation, session.generation
                );
                for prepared in [reference_result, user_result].into_iter().flatten() {
                    prepared.asset.revoke();
                }
                return LoadOutcome::Superseded;
            }

            for (role, result) in [
                (TrackRole::Reference, reference_result),
                (TrackRole::User, user_result),
            ] {
                if let Some(notice) = self.install(&mut session, generation, role, result) {
                    notices.push(notice);
                }
            }

            LoadOutcome::Loaded {
                reference: session.reference.state.clone(),
                user: session.user.state.clone(),
            }
        };

        for notice in notices {
            self.notify(notice);
        }
        self.notify(ControllerEvent::PairLoaded { generation });
        outcome
    }

    fn install(
        &self,
        session: &mut Session,
        generation: u64,
        role: TrackRole,
        result: AudioResult<PreparedTrack>,
    ) -> Option<ControllerEvent> {
        let prepared = match result {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!("{} track failed to load: {}", role, err);
                let failure = TrackFailure::from(&err);
                session.track_mut(role).fail(failure.clone());
                return Some(ControllerEvent::TrackFailed { role, failure });
            }
        };

        let sink = EventSink::new(role, generation, self.events_tx.clone());
        let style = RendererStyle::for_role(role);
        match self
            .factory
            .create(role, &prepared.asset.handle, &style, sink)
        {
            Ok(renderer) => {
                session
                    .track_mut(role)
                    .bind(prepared.asset, prepared.bounds, renderer);
                None
            }
            Err(err) => {
                warn!("{} renderer could not be bound: {}", role, err);
                prepared.asset.revoke();
                let failure = TrackFailure::from(&err);
                session.track_mut(role).fail(failure.clone());
                Some(ControllerEvent::TrackFailed { role, failure })
            }
        }
    }

    /// Switch the transport to `version`, rewinding both tracks
    pub fn select_version(&self, version: TrackRole) {
        let mut notices = Vec::new();
        {
            let mut session = self.session.lock();
            if session.selected == version {
                return;
            }
            for role in TrackRole::ALL {
                let was_playing = session.track(role).is_playing();
                session.track_mut(role).rewind();
                if was_playing {
                    notices.push(ControllerEvent::PlayStateChanged {
                        role,
                        playing: false,
                    });
                }
            }
            session.selected = version;
        }
        notices.push(ControllerEvent::VersionChanged(version));
        for notice in notices {
            self.notify(notice);
        }
    }

    /// Currently selected version
    pub fn selected_version(&self) -> TrackRole {
        self.session.lock().selected
    }

    /// Play or pause the selected track. Returns whether it is now playing.
    pub fn toggle_play(&self) -> AudioResult<bool> {
        let mut session = self.session.lock();
        let selected = session.selected;

        if session.track(selected).is_playing() {
            session.track_mut(selected).pause();
            drop(session);
            self.notify(ControllerEvent::PlayStateChanged {
                role: selected,
                playing: false,
            });
            return Ok(false);
        }

        let other = selected.other();
        let other_stopped = session.track(other).is_playing();
        if other_stopped {
            session.track_mut(other).pause();
        }

        let result = session.track_mut(selected).play();
        if other_stopped {
            self.notify(ControllerEvent::PlayStateChanged {
                role: other,
                playing: false,
            });
        }

        match result {
            Ok(()) => {
                drop(session);
                self.notify(ControllerEvent::PlayStateChanged {
                    role: selected,
                    playing: true,
                });
                Ok(true)
            }
            Err(err) if err.is_track_scoped() => {
                let failure = TrackFailure::from(&err);
                session.track_mut(selected).fail(failure.clone());
                drop(session);
                self.notify(ControllerEvent::PlaybackFailed {
                    role: selected,
                    failure,
                });
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Move a track's playhead. Returns the clamped position.
    pub fn seek(&self, role: TrackRole, seconds: f64) -> AudioResult<f64> {
        self.session.lock().track_mut(role).seek(seconds)
    }

    /// Whether the selected track is playing
    pub fn is_playing(&self) -> bool {
        let session = self.session.lock();
        session.track(session.selected).is_playing()
    }

    /// Apply one renderer notification
    pub fn handle_event(&self, event: TrackEvent) {
        let mut notices = Vec::new();
        {
            let mut session = self.session.lock();
            if event.generation != session.generation {
                debug!(
                    "Ignoring {:?} from stale {} renderer #{}",
                    event.event, event.role, event.generation
                );
                return;
            }

            let role = event.role;
            match event.event {
                RendererEvent::Play => {
                    // Tracks started through `toggle_play` are already Playing
                    let track = session.track(role);
                    if track.is_playing() && track.state != TrackState::Playing {
                        session.track_mut(role).state = TrackState::Playing;
                        let other = role.other();
                        if session.track(other).is_playing() {
                            session.track_mut(other).pause();
                            notices.push(ControllerEvent::PlayStateChanged {
                                role: other,
                                playing: false,
                            });
                        }
                        notices.push(ControllerEvent::PlayStateChanged {
                            role,
                            playing: true,
                        });
                    }
                }
                RendererEvent::Pause => {
                    let track = session.track_mut(role);
                    if track.state == TrackState::Playing && !track.is_playing() {
                        track.state = TrackState::Paused;
                        notices.push(ControllerEvent::PlayStateChanged {
                            role,
                            playing: false,
                        });
                    }
                }
                RendererEvent::Finish => {
                    let track = session.track_mut(role);
                    if track.state.is_loaded() && !track.is_playing() {
                        track.state = TrackState::Finished;
                        notices.push(ControllerEvent::PlayStateChanged {
                            role,
                            playing: false,
                        });
                    }
                }
                RendererEvent::Error(message) => {
                    warn!("{} playback failed: {}", role, message);
                    let failure = TrackFailure {
                        kind: FailureKind::Renderer,
                        message,
                    };
                    session.track_mut(role).fail(failure.clone());
                    notices.push(ControllerEvent::PlaybackFailed { role, failure });
                }
            }
        }

        for notice in notices {
            self.notify(notice);
        }
    }

    /// Apply every queued renderer notification. Returns how many were seen.
    pub fn pump_events(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = self.events_rx.lock().try_recv();
            match next {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(_) => return handled,
            }
        }
    }

    /// Advance externally clocked renderers and apply what they report
    pub fn advance(&self, elapsed: Duration) {
        {
            let mut session = self.session.lock();
            session.reference.tick(elapsed);
            session.user.tick(elapsed);
        }
        self.pump_events();
    }

    /// Current view for drawing
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        SessionSnapshot {
            generation: session.generation,
            selected: session.selected,
            is_playing: session.track(session.selected).is_playing(),
            reference: session.snapshot_track(TrackRole::Reference),
            user: session.snapshot_track(TrackRole::User),
        }
    }

    /// Destroy both renderers, revoke both resources and cancel pending loads.
    ///
    /// Safe to call any number of times, loaded or not.
    pub fn teardown(&self) {
        let mut session = self.session.lock();
        session.generation += 1;
        session.selected = TrackRole::Reference;
        session.release_all();
    }
}

impl Drop for DualTrackController {
    fn drop(&mut self) {
        self.session.get_mut().release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BitDepth, DecodedBuffer};
    use crate::encoder::{ResourceHandle, ResourceRegistry, encode_wav};
    use crate::fetch::Fetcher;
    use crate::filter::TrimParams;
    use crate::player::renderer::Renderer;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;

    struct ToneFetcher;

    #[async_trait]
    impl Fetcher for ToneFetcher {
        async fn fetch(&self, _url: &str) -> AudioResult<Bytes> {
            let mut samples = vec![0.0f32; 4096];
            samples.extend((0..8000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }));
            samples.extend(vec![0.0f32; 4096]);
            let buffer = DecodedBuffer::new(vec![samples], 8000)?;
            Ok(Bytes::from(encode_wav(&buffer, BitDepth::I16)?))
        }
    }

    /// Renderer whose transport can also be driven from outside
    struct ScriptedRenderer {
        playing: Arc<Mutex<bool>>,
        events: EventSink,
    }

    impl Renderer for ScriptedRenderer {
        fn play(&mut self) -> AudioResult<()> {
            *self.playing.lock() = true;
            self.events.emit(RendererEvent::Play);
            Ok(())
        }

        fn pause(&mut self) {
            *self.playing.lock() = false;
            self.events.emit(RendererEvent::Pause);
        }

        fn seek_to(&mut self, _seconds: f64) {}

        fn position(&self) -> f64 {
            0.0
        }

        fn duration(&self) -> f64 {
            1.0
        }

        fn is_playing(&self) -> bool {
            *self.playing.lock()
        }

        fn peaks(&self) -> &[f32] {
            &[]
        }

        fn destroy(&mut self) {
            *self.playing.lock() = false;
        }
    }

    #[derive(Default)]
    struct ScriptedFactory {
        remotes: Mutex<HashMap<TrackRole, (Arc<Mutex<bool>>, EventSink)>>,
    }

    impl ScriptedFactory {
        /// Start a renderer the way a click on its waveform would
        fn start_externally(&self, role: TrackRole) {
            let remotes = self.remotes.lock();
            let (playing, events) = &remotes[&role];
            *playing.lock() = true;
            events.emit(RendererEvent::Play);
        }
    }

    impl RendererFactory for ScriptedFactory {
        fn create(
            &self,
            role: TrackRole,
            _handle: &ResourceHandle,
            _style: &RendererStyle,
            events: EventSink,
        ) -> AudioResult<Box<dyn Renderer>> {
            let playing = Arc::new(Mutex::new(false));
            self.remotes
                .lock()
                .insert(role, (playing.clone(), events.clone()));
            Ok(Box::new(ScriptedRenderer { playing, events }))
        }
    }

    fn scripted() -> (DualTrackController, Arc<ScriptedFactory>) {
        let pipeline = TrackPipeline::new(
            Arc::new(ToneFetcher),
            ResourceRegistry::new(),
            TrimParams::new(18.0),
            BitDepth::I16,
        )
        .unwrap();
        let factory = Arc::new(ScriptedFactory::default());
        let controller = DualTrackController::new(pipeline, factory.clone());
        (controller, factory)
    }

    #[tokio::test]
    async fn test_external_play_pauses_sibling() {
        let (controller, factory) = scripted();
        controller
            .load_pair(AudioSource::reference("a"), AudioSource::user("b"))
            .await;

        assert!(controller.toggle_play().unwrap());
        controller.pump_events();

        factory.start_externally(TrackRole::User);
        controller.pump_events();

        let snapshot = controller.snapshot();
        assert!(snapshot.user.playing);
        assert_eq!(snapshot.user.state, TrackState::Playing);
        assert!(!snapshot.reference.playing);
        assert_eq!(snapshot.reference.state, TrackState::Paused);
    }

    fn drain(rx: &mut broadcast::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn play_state(role: TrackRole, playing: bool) -> ControllerEvent {
        ControllerEvent::PlayStateChanged { role, playing }
    }

    #[tokio::test]
    async fn test_notices_never_show_two_tracks_playing() {
        let (controller, factory) = scripted();
        controller
            .load_pair(AudioSource::reference("a"), AudioSource::user("b"))
            .await;
        let mut notices = controller.subscribe();

        controller.toggle_play().unwrap();
        controller.pump_events();
        factory.start_externally(TrackRole::User);
        controller.pump_events();
        controller.pump_events();

        assert_eq!(
            drain(&mut notices),
            vec![
                play_state(TrackRole::Reference, true),
                play_state(TrackRole::Reference, false),
                play_state(TrackRole::User, true),
            ]
        );

        // Taking the transport back stops the externally started track
        assert!(controller.toggle_play().unwrap());
        controller.pump_events();
        assert_eq!(
            drain(&mut notices),
            vec![
                play_state(TrackRole::User, false),
                play_state(TrackRole::Reference, true),
            ]
        );

        controller.select_version(TrackRole::User);
        controller.pump_events();
        assert_eq!(
            drain(&mut notices),
            vec![
                play_state(TrackRole::Reference, false),
                ControllerEvent::VersionChanged(TrackRole::User),
            ]
        );
    }

    #[tokio::test]
    async fn test_late_play_event_does_not_resurrect_paused_track() {
        let (controller, _factory) = scripted();
        controller
            .load_pair(AudioSource::reference("a"), AudioSource::user("b"))
            .await;

        // Play and Pause both queued before the controller looks
        controller.toggle_play().unwrap();
        controller.toggle_play().unwrap();
        assert_eq!(controller.pump_events(), 2);

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.reference.state, TrackState::Paused);
    }

    #[tokio::test]
    async fn test_transport_before_load_is_rejected() {
        let (controller, _factory) = scripted();
        assert!(matches!(
            controller.toggle_play(),
            Err(crate::error::AudioError::TrackUnavailable { .. })
        ));
        assert!(!controller.is_playing());
        controller.teardown();
    }
}
