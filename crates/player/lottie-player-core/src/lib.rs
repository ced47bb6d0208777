//! Lottie Player Core (engine-agnostic)
//!
//! Playback controller for embedded Lottie animations. The crate owns the
//! player state machine, source resolution (inline data, JSON text or URL),
//! the host event vocabulary and the control-surface commands. Rendering is
//! delegated to an [`EngineAdapter`]; the wasm crate supplies one backed by
//! lottie-web.

pub mod color;
pub mod config;
pub mod controller;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod interaction;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod view;

// Re-exports for consumers (adapters)
pub use color::{Background, Rgb};
pub use config::{
    Button, Direction, HostEnvironment, PlaybackConfig, PlayerConfig, Renderer, RendererSettings,
    Theme, DEFAULT_CONTAINER_ID,
};
pub use controller::{FetchRequest, LoadProgress, LoadTicket, PlayerController};
pub use data::AnimationData;
pub use engine::{
    engine_event_channel, AnimationHandle, AnimationInstance, EngineAdapter, EngineError,
    EngineEvent, EngineEventKind, EngineEventSender, EngineSignal, HandleAllocator, ListenerToken,
    LoadRequest, SurfaceCapture,
};
pub use error::{FetchError, LoadError, PlayerError};
pub use events::{EventBus, Notification, PlayerEvent, SubscriptionId};
pub use interaction::PointerInput;
pub use snapshot::{encode_uri_component, Downloader, Snapshot};
pub use source::{
    resolve_source, FetchResponse, Fetcher, Resolution, SourceDescriptor, SourceUrl,
};
pub use state::PlaybackState;
pub use view::PlayerView;

/// Result type for controller operations.
pub type Result<T> = core::result::Result<T, PlayerError>;
