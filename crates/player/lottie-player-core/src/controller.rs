//! Playback controller: owns one engine adapter and drives the player state
//! machine.
//!
//! The controller reconciles three sources of change into one state:
//! - commands from the host or control surface (`play`, `seek`, ...),
//! - the asynchronous load of a source descriptor,
//! - lifecycle events emitted by the engine.
//!
//! # Load sequencing
//!
//! `load` destroys any live handle first, enters `Loading` and resolves the
//! source. Inline data installs immediately; URL sources return a
//! [`FetchRequest`] and the host answers with `complete_fetch`. Each load gets
//! a fresh [`LoadTicket`]; a fetch completing for a superseded ticket, or after
//! `unmount`, is dropped without touching state.
//!
//! # Policies
//!
//! - Without `autoplay` a successful load settles in `Paused`.
//! - Natural completion with looping off settles in `Stopped`. The seeker
//!   rewinds to 0 unless `keep_last_frame` is set.
//! - State-change observers are notified on every update, even when the
//!   state did not change.
//! - Commands issued while no handle is live are ignored.

use crossbeam_channel::Receiver;
use log::{debug, info, warn};

use crate::color::Background;
use crate::config::{is_valid_speed, Direction, HostEnvironment, PlaybackConfig, PlayerConfig};
use crate::data::AnimationData;
use crate::engine::{
    engine_event_channel, AnimationHandle, AnimationInstance, EngineAdapter, EngineEvent,
    EngineEventKind, EngineEventSender, EngineSignal, ListenerToken, LoadRequest,
};
use crate::error::{FetchError, LoadError, PlayerError};
use crate::events::{EventBus, Notification, PlayerEvent};
use crate::interaction::{pointer_action, PointerAction, PointerInput};
use crate::snapshot::{Downloader, Snapshot};
use crate::source::{resolve_source, FetchResponse, Fetcher, Resolution, SourceDescriptor, SourceUrl};
use crate::state::PlaybackState;
use crate::view::PlayerView;

/// Identifies one load request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LoadTicket(u64);

/// A URL the host must fetch before the load can continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: LoadTicket,
    pub url: SourceUrl,
}

/// Result of starting or continuing a load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadProgress {
    /// Load finished in the given state (`Playing`, `Paused` or `Error`)
    Settled(PlaybackState),
    /// Waiting for the host to fetch the source
    AwaitingFetch(FetchRequest),
    /// Request was stale or the controller is unmounted
    Ignored,
}

/// The live engine instance and its listener tokens.
#[derive(Debug)]
struct LiveAnimation {
    handle: AnimationHandle,
    listeners: Vec<ListenerToken>,
    instance: AnimationInstance,
}

#[derive(Debug)]
struct PendingFetch {
    ticket: LoadTicket,
    url: SourceUrl,
}

pub struct PlayerController<E: EngineAdapter> {
    engine: E,
    config: PlayerConfig,
    env: HostEnvironment,
    bus: EventBus,

    state: PlaybackState,
    seeker: u32,
    total_frames: u32,
    looping: bool,
    speed: f64,
    direction: Direction,
    background: Background,

    live: Option<LiveAnimation>,
    source: Option<SourceDescriptor>,
    next_ticket: u64,
    pending: Option<PendingFetch>,
    unmounted: bool,
    last_error: Option<LoadError>,

    signals_tx: EngineEventSender,
    signals_rx: Receiver<EngineSignal>,
    downloader: Option<Box<dyn Downloader>>,
}

impl<E: EngineAdapter> std::fmt::Debug for PlayerController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerController")
            .field("state", &self.state)
            .field("seeker", &self.seeker)
            .field("total_frames", &self.total_frames)
            .field("handle", &self.handle())
            .field("unmounted", &self.unmounted)
            .finish()
    }
}

impl<E: EngineAdapter> PlayerController<E> {
    /// Create a controller around `engine`. Nothing is loaded until `mount`
    /// or `load` is called.
    pub fn new(engine: E, config: PlayerConfig) -> crate::Result<Self> {
        config.validate()?;
        let background = match config.background.as_deref() {
            Some(css) => Background::parse(css).unwrap_or_else(|err| {
                warn!("initial background ignored: {err}");
                Background::Transparent
            }),
            None => Background::Transparent,
        };
        let (signals_tx, signals_rx) = engine_event_channel();

        Ok(Self {
            engine,
            looping: config.looping,
            speed: config.speed,
            direction: config.direction,
            config,
            env: HostEnvironment::default(),
            bus: EventBus::new(),
            state: PlaybackState::Loading,
            seeker: 0,
            total_frames: 0,
            background,
            live: None,
            source: None,
            next_ticket: 0,
            pending: None,
            unmounted: false,
            last_error: None,
            signals_tx,
            signals_rx,
            downloader: None,
        })
    }

    pub fn with_environment(mut self, env: HostEnvironment) -> Self {
        self.env = env;
        self
    }

    pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        self.downloader = Some(Box::new(downloader));
        self
    }

    // ========== Observation ==========

    /// Subscription interface for observers.
    #[inline]
    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Notifications queued since the last poll.
    #[inline]
    pub fn poll_notifications(&mut self) -> Vec<Notification> {
        self.bus.poll()
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn seeker(&self) -> u32 {
        self.seeker
    }

    #[inline]
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn background(&self) -> &Background {
        &self.background
    }

    #[inline]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[inline]
    pub fn handle(&self) -> Option<AnimationHandle> {
        self.live.as_ref().map(|l| l.handle)
    }

    /// Read-only description of the live instance.
    #[inline]
    pub fn instance(&self) -> Option<&AnimationInstance> {
        self.live.as_ref().map(|l| &l.instance)
    }

    /// Why the last load failed, for diagnostics.
    #[inline]
    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        !self.unmounted
    }

    /// Inspection access to the adapter.
    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            state: self.state,
            seeker: self.seeker,
            total_frames: self.total_frames,
            looping: self.looping,
            speed: self.speed,
            direction: self.direction,
            background: self.background.clone(),
            buttons: self.config.buttons.clone(),
            theme: self.config.resolved_theme(self.env.prefers_dark),
            controls: self.config.controls,
            has_instance: self.live.is_some(),
        }
    }

    /// Snapshot of the options the engine receives for the next load.
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            looping: self.looping,
            speed: self.speed,
            direction: self.direction,
            ..self.config.playback_config()
        }
    }

    // ========== Lifecycle ==========

    /// Load the configured `src`, if any.
    pub fn mount(&mut self) -> LoadProgress {
        if self.unmounted {
            return LoadProgress::Ignored;
        }
        match self.config.src.clone() {
            Some(src) => self.load(src),
            None => {
                debug!("mount without src; waiting for load()");
                LoadProgress::Ignored
            }
        }
    }

    /// Tear down the live instance and ignore any load still in flight.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        info!("unmounting player '{}'", self.config.container_id());
        self.unmounted = true;
        self.pending = None;
        self.teardown_live();
    }

    /// Start loading `source`, replacing whatever was loaded before.
    pub fn load(&mut self, source: impl Into<SourceDescriptor>) -> LoadProgress {
        if self.unmounted {
            debug!("load ignored: controller unmounted");
            return LoadProgress::Ignored;
        }
        let source = source.into();
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        self.teardown_live();
        self.pending = None;
        self.last_error = None;
        self.source = Some(source.clone());
        self.total_frames = 0;
        self.set_seeker_value(0);
        self.update_state(PlaybackState::Loading);

        match resolve_source(&source, self.env.base_url.as_deref()) {
            Ok(Resolution::Ready(data)) => {
                info!("loading inline animation data");
                LoadProgress::Settled(self.install(data))
            }
            Ok(Resolution::Fetch(url)) => {
                info!("loading animation from {url}");
                self.pending = Some(PendingFetch {
                    ticket,
                    url: url.clone(),
                });
                LoadProgress::AwaitingFetch(FetchRequest { ticket, url })
            }
            Err(err) => LoadProgress::Settled(self.fail(err)),
        }
    }

    /// Load the last source again. Clears `Error`.
    pub fn reload(&mut self) -> LoadProgress {
        match self.source.clone() {
            Some(source) => self.load(source),
            None => LoadProgress::Ignored,
        }
    }

    /// Deliver the outcome of a fetch requested by `load`.
    pub fn complete_fetch(
        &mut self,
        ticket: LoadTicket,
        result: Result<FetchResponse, FetchError>,
    ) -> LoadProgress {
        if self.unmounted {
            debug!("discarding fetch result for {ticket:?}: unmounted");
            return LoadProgress::Ignored;
        }
        let pending = match self.pending.take() {
            Some(p) if p.ticket == ticket => p,
            other => {
                debug!("discarding stale fetch result for {ticket:?}");
                self.pending = other;
                return LoadProgress::Ignored;
            }
        };

        let data = result
            .map_err(|source| LoadError::Fetch {
                url: pending.url.to_string(),
                source,
            })
            .and_then(|response| response.into_animation(&pending.url));

        match data {
            Ok(data) => LoadProgress::Settled(self.install(data)),
            Err(err) => LoadProgress::Settled(self.fail(err)),
        }
    }

    /// Load `source`, fetching through `fetcher` when it names a URL.
    pub fn load_with<F: Fetcher>(
        &mut self,
        source: impl Into<SourceDescriptor>,
        fetcher: &mut F,
    ) -> LoadProgress {
        match self.load(source) {
            LoadProgress::AwaitingFetch(request) => {
                let result = fetcher.fetch(&request.url);
                self.complete_fetch(request.ticket, result)
            }
            other => other,
        }
    }

    fn install(&mut self, data: AnimationData) -> PlaybackState {
        self.teardown_live();

        let playback = self.playback_config();
        let request = LoadRequest {
            data: &data,
            config: &playback,
            container: self.config.container_id(),
        };
        let handle = match self.engine.load(request) {
            Ok(handle) => handle,
            Err(err) => {
                return self.fail(LoadError::EngineLoad { reason: err.reason });
            }
        };

        self.total_frames = self
            .engine
            .total_frames(handle)
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.floor() as u32)
            .unwrap_or_else(|| data.total_frames());

        let listeners = EngineEventKind::ALL
            .iter()
            .map(|kind| {
                self.engine
                    .subscribe(handle, *kind, self.signals_tx.clone())
            })
            .collect();

        let instance = AnimationInstance {
            handle,
            total_frames: self.total_frames,
            frame_rate: data.frame_rate,
            width: data.width,
            height: data.height,
            version: data.version.clone(),
            renderer: self.config.renderer,
        };
        self.live = Some(LiveAnimation {
            handle,
            listeners,
            instance: instance.clone(),
        });
        info!(
            "animation {handle:?} loaded ({} frames)",
            self.total_frames
        );

        self.engine.set_speed(handle, self.speed);
        self.engine.set_direction(handle, self.direction);

        self.emit_event(PlayerEvent::InstanceSaved);
        self.bus.emit(Notification::InstanceSaved(instance));

        // `play()` refuses while still Loading, so drive the engine here.
        if self.config.autoplay {
            self.engine.play(handle);
            self.update_state(PlaybackState::Playing);
            self.emit_event(PlayerEvent::Play);
        } else {
            self.update_state(PlaybackState::Paused);
        }
        self.state
    }

    fn fail(&mut self, err: LoadError) -> PlaybackState {
        warn!("load failed ({}): {err}", err.category());
        self.teardown_live();
        self.pending = None;
        self.last_error = Some(err);
        self.update_state(PlaybackState::Error);
        self.emit_event(PlayerEvent::Error);
        self.state
    }

    fn teardown_live(&mut self) {
        if let Some(live) = self.live.take() {
            debug!("destroying animation {:?}", live.handle);
            for token in live.listeners {
                self.engine.unsubscribe(live.handle, token);
            }
            self.engine.destroy(live.handle);
        }
    }

    // ========== Commands ==========

    fn command_target(&self) -> Option<AnimationHandle> {
        if !self.state.accepts_commands() {
            return None;
        }
        self.handle()
    }

    pub fn play(&mut self) {
        let Some(handle) = self.command_target() else {
            debug!("play ignored: no live animation");
            return;
        };
        self.engine.play(handle);
        self.update_state(PlaybackState::Playing);
        self.emit_event(PlayerEvent::Play);
    }

    pub fn pause(&mut self) {
        let Some(handle) = self.command_target() else {
            debug!("pause ignored: no live animation");
            return;
        };
        self.engine.pause(handle);
        self.update_state(PlaybackState::Paused);
        self.emit_event(PlayerEvent::Pause);
    }

    pub fn stop(&mut self) {
        let Some(handle) = self.command_target() else {
            debug!("stop ignored: no live animation");
            return;
        };
        self.engine.stop(handle);
        self.update_state(PlaybackState::Stopped);
        self.emit_event(PlayerEvent::Stop);
    }

    /// Jump to `frame` (clamped to the animation) and play or pause there.
    pub fn set_seeker(&mut self, frame: u32, play: bool) {
        let Some(handle) = self.command_target() else {
            debug!("seek ignored: no live animation");
            return;
        };
        let frame = if self.total_frames > 0 {
            frame.min(self.total_frames)
        } else {
            frame
        };
        self.engine.go_to(handle, frame as f64, play);
        self.set_seeker_value(frame);
        if play {
            self.update_state(PlaybackState::Playing);
            self.emit_event(PlayerEvent::Play);
        } else {
            self.update_state(PlaybackState::Paused);
            self.emit_event(PlayerEvent::Pause);
        }
    }

    pub fn set_loop(&mut self, looping: bool) {
        let Some(handle) = self.command_target() else {
            return;
        };
        self.engine.set_loop(handle, looping);
        self.looping = looping;
    }

    /// Change playback speed. Rejects non-finite or non-positive values.
    pub fn set_speed(&mut self, speed: f64) -> crate::Result<()> {
        if !is_valid_speed(speed) {
            return Err(PlayerError::InvalidSpeed { speed });
        }
        if let Some(handle) = self.command_target() {
            self.engine.set_speed(handle, speed);
            self.speed = speed;
        }
        Ok(())
    }

    pub fn set_direction(&mut self, direction: Direction) {
        let Some(handle) = self.command_target() else {
            return;
        };
        self.engine.set_direction(handle, direction);
        self.direction = direction;
    }

    /// Colour-picker callback. Independent of playback state.
    pub fn set_background(&mut self, color: &str) -> crate::Result<()> {
        let background = Background::parse(color)?;
        let css = background.as_css().to_string();
        self.background = background;
        self.bus.emit(Notification::BackgroundChanged(css));
        Ok(())
    }

    /// Export the current frame; optionally hand it to the downloader.
    pub fn snapshot(&mut self, download: bool) -> Option<Snapshot> {
        let handle = self.handle()?;
        let capture = self.engine.capture(handle)?;
        let snapshot = Snapshot::from_capture(capture, self.config.renderer);
        if download {
            match self.downloader.as_mut() {
                Some(downloader) => downloader.download(&snapshot.data_uri, &snapshot.filename),
                None => debug!("snapshot download requested without a downloader"),
            }
        }
        Some(snapshot)
    }

    /// Hover/click behaviour on the rendering container.
    pub fn handle_pointer(&mut self, input: PointerInput) {
        let action = pointer_action(
            input,
            self.config.hover,
            self.config.click,
            self.config.keep_last_frame,
            self.state.is_playing(),
        );
        match action {
            PointerAction::Start { restart } => {
                if restart {
                    self.stop();
                }
                self.play();
            }
            PointerAction::Stop => self.stop(),
            PointerAction::Nothing => {}
        }
    }

    // ========== Engine events ==========

    /// Drain queued engine signals in emission order. Returns how many were
    /// processed.
    pub fn pump_engine_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(signal) = self.signals_rx.try_recv() {
            self.handle_engine_event(signal.handle, signal.event);
            count += 1;
        }
        count
    }

    /// Translate one engine event. Events for any handle other than the live
    /// one are dropped.
    pub fn handle_engine_event(&mut self, handle: AnimationHandle, event: EngineEvent) {
        if self.unmounted || self.handle() != Some(handle) {
            debug!("dropping {:?} for stale handle {handle:?}", event.kind());
            return;
        }

        match event {
            EngineEvent::FrameAdvance { current_frame } => {
                let mut frame = if current_frame.is_finite() {
                    current_frame.max(0.0).floor() as u32
                } else {
                    0
                };
                if self.total_frames > 0 {
                    frame = frame.min(self.total_frames);
                }
                self.emit_event(PlayerEvent::Frame { frame });
                self.set_seeker_value(frame);
            }
            EngineEvent::ReadyToRender => self.emit_event(PlayerEvent::Load),
            EngineEvent::DataReady => self.emit_event(PlayerEvent::Ready),
            EngineEvent::DataFailed { reason } => {
                self.fail(LoadError::EngineLoad {
                    reason: reason.unwrap_or_else(|| "engine reported data_failed".to_string()),
                });
            }
            EngineEvent::LoopComplete => self.emit_event(PlayerEvent::Loop),
            EngineEvent::PlaybackComplete => {
                self.emit_event(PlayerEvent::Complete);
                if self.looping {
                    return;
                }
                self.update_state(PlaybackState::Stopped);
                if !self.config.keep_last_frame {
                    self.engine.go_to(handle, 0.0, false);
                    self.set_seeker_value(0);
                }
            }
        }
    }

    // ========== Dispatch ==========

    fn update_state(&mut self, state: PlaybackState) {
        if self.state != state {
            debug!("state {} -> {}", self.state, state);
        }
        self.state = state;
        self.bus.emit(Notification::StateChanged(state));
    }

    fn emit_event(&mut self, event: PlayerEvent) {
        self.bus.emit(Notification::Event(event));
    }

    fn set_seeker_value(&mut self, frame: u32) {
        if self.seeker != frame {
            self.seeker = frame;
            self.bus.emit(Notification::SeekerChanged(frame));
        }
    }
}

impl<E: EngineAdapter> Drop for PlayerController<E> {
    fn drop(&mut self) {
        self.teardown_live();
    }
}
