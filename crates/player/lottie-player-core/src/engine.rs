//! Engine adapter contract.
//!
//! The controller never talks to a rendering engine directly; it goes through
//! an [`EngineAdapter`]. Adapters deliver lifecycle events by pushing
//! [`EngineSignal`]s into the [`EngineEventSender`] handed to `subscribe`, and
//! the controller drains them in emission order via
//! `PlayerController::pump_engine_events`.
//!
//! Engine instances are never patched with wrapper methods. Hosts that want
//! to drive playback call the controller; the [`AnimationInstance`] they get
//! back is inspection-only.

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::config::{Direction, PlaybackConfig};
use crate::data::AnimationData;

/// Opaque reference to one loaded animation inside an engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimationHandle(pub u32);

/// Token returned by [`EngineAdapter::subscribe`]; pass it back to cancel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ListenerToken(pub u32);

/// Monotonic allocator for handles and listener tokens.
#[derive(Default, Debug)]
pub struct HandleAllocator {
    next_handle: u32,
    next_token: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_handle(&mut self) -> AnimationHandle {
        let id = AnimationHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_token(&mut self) -> ListenerToken {
        let id = ListenerToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        id
    }
}

/// Engine-native lifecycle events the controller subscribes to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineEventKind {
    /// `enterFrame`
    FrameAdvance,
    /// `DOMLoaded`
    ReadyToRender,
    /// `data_ready`
    DataReady,
    /// `data_failed`
    DataFailed,
    /// `loopComplete`
    LoopComplete,
    /// `complete`
    PlaybackComplete,
}

impl EngineEventKind {
    pub const ALL: [EngineEventKind; 6] = [
        EngineEventKind::FrameAdvance,
        EngineEventKind::ReadyToRender,
        EngineEventKind::DataReady,
        EngineEventKind::DataFailed,
        EngineEventKind::LoopComplete,
        EngineEventKind::PlaybackComplete,
    ];

    /// Event name used by lottie-web's `addEventListener`.
    #[inline]
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::FrameAdvance => "enterFrame",
            Self::ReadyToRender => "DOMLoaded",
            Self::DataReady => "data_ready",
            Self::DataFailed => "data_failed",
            Self::LoopComplete => "loopComplete",
            Self::PlaybackComplete => "complete",
        }
    }
}

/// Event emitted by an engine for one handle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    FrameAdvance { current_frame: f64 },
    ReadyToRender,
    DataReady,
    DataFailed { reason: Option<String> },
    LoopComplete,
    PlaybackComplete,
}

impl EngineEvent {
    #[inline]
    pub fn kind(&self) -> EngineEventKind {
        match self {
            Self::FrameAdvance { .. } => EngineEventKind::FrameAdvance,
            Self::ReadyToRender => EngineEventKind::ReadyToRender,
            Self::DataReady => EngineEventKind::DataReady,
            Self::DataFailed { .. } => EngineEventKind::DataFailed,
            Self::LoopComplete => EngineEventKind::LoopComplete,
            Self::PlaybackComplete => EngineEventKind::PlaybackComplete,
        }
    }
}

/// An engine event tagged with the handle that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSignal {
    pub handle: AnimationHandle,
    pub event: EngineEvent,
}

/// Sending half given to adapters; cheap to clone into engine callbacks.
#[derive(Clone, Debug)]
pub struct EngineEventSender {
    tx: Sender<EngineSignal>,
}

impl EngineEventSender {
    /// Queue an event. Dropped silently if the controller is gone.
    pub fn send(&self, handle: AnimationHandle, event: EngineEvent) {
        let _ = self.tx.send(EngineSignal { handle, event });
    }
}

/// Create a connected sender/receiver pair.
pub fn engine_event_channel() -> (EngineEventSender, Receiver<EngineSignal>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EngineEventSender { tx }, rx)
}

/// Everything an engine needs to create an animation instance.
#[derive(Debug)]
pub struct LoadRequest<'a> {
    pub data: &'a AnimationData,
    pub config: &'a PlaybackConfig,
    /// Element id of the rendering container
    pub container: &'a str,
}

/// Raw capture of the rendering surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceCapture {
    /// Serialised vector markup (`<svg ...>...</svg>`)
    Markup(String),
    /// Already-encoded raster data URI (`data:image/png;base64,...`)
    DataUri(String),
}

/// Failure reported synchronously by [`EngineAdapter::load`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct EngineError {
    pub reason: String,
}

impl EngineError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Facade over a concrete rendering engine.
///
/// Control methods take the handle the adapter returned from `load`; calls
/// for handles the adapter no longer knows must be ignored.
pub trait EngineAdapter {
    fn load(&mut self, request: LoadRequest<'_>) -> Result<AnimationHandle, EngineError>;
    fn destroy(&mut self, handle: AnimationHandle);

    fn play(&mut self, handle: AnimationHandle);
    fn pause(&mut self, handle: AnimationHandle);
    fn stop(&mut self, handle: AnimationHandle);
    /// Jump to `frame`; keep playing afterwards when `resume_playing`.
    fn go_to(&mut self, handle: AnimationHandle, frame: f64, resume_playing: bool);

    fn set_speed(&mut self, handle: AnimationHandle, speed: f64);
    fn set_direction(&mut self, handle: AnimationHandle, direction: Direction);
    fn set_loop(&mut self, handle: AnimationHandle, looping: bool);

    /// Start forwarding `kind` events for `handle` into `sink`.
    fn subscribe(
        &mut self,
        handle: AnimationHandle,
        kind: EngineEventKind,
        sink: EngineEventSender,
    ) -> ListenerToken;
    fn unsubscribe(&mut self, handle: AnimationHandle, token: ListenerToken);

    /// Frame count reported by the engine, if it knows better than the data.
    fn total_frames(&self, _handle: AnimationHandle) -> Option<f64> {
        None
    }

    /// Capture the rendering surface for export.
    fn capture(&self, _handle: AnimationHandle) -> Option<SurfaceCapture> {
        None
    }
}

/// Read-only description of a live animation, handed to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationInstance {
    pub handle: AnimationHandle,
    pub total_frames: u32,
    pub frame_rate: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub version: Option<String>,
    pub renderer: crate::config::Renderer,
}
