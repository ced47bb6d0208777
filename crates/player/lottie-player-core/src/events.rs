//! Player events and the notification bus.
//!
//! Every observable change leaves the controller through one path:
//! [`EventBus::emit`]. Emitting invokes subscribed listeners immediately (in
//! subscription order) and also queues the notification for [`EventBus::poll`],
//! so hosts that cannot re-enter the controller from inside a callback can
//! drain notifications after the call returns.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::AnimationInstance;
use crate::state::PlaybackState;

/// Maximum notifications in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Host-facing event vocabulary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Engine finished building the rendering surface
    Load,
    /// A new animation handle was created
    InstanceSaved,
    Error,
    /// Engine finished parsing the animation data
    Ready,
    Play,
    Pause,
    Stop,
    Loop,
    Complete,
    Frame { frame: u32 },
}

impl PlayerEvent {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::InstanceSaved => "instanceSaved",
            Self::Error => "error",
            Self::Ready => "ready",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Loop => "loop",
            Self::Complete => "complete",
            Self::Frame { .. } => "frame",
        }
    }
}

/// Anything the controller tells its observers.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Event(PlayerEvent),
    StateChanged(PlaybackState),
    BackgroundChanged(String),
    /// Read-only reference to a freshly created instance
    InstanceSaved(AnimationInstance),
    SeekerChanged(u32),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Notification)>;

/// Single-threaded pub/sub bus with deferred polling.
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    queue: Vec<Notification>,
    next_id: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("queue_len", &self.queue.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            queue: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribe to every notification.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Subscribe to player events only.
    pub fn on_event<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&PlayerEvent) + 'static,
    {
        self.subscribe(move |n| {
            if let Notification::Event(event) = n {
                callback(event);
            }
        })
    }

    /// Subscribe to playback state updates only.
    pub fn on_state_change<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(PlaybackState) + 'static,
    {
        self.subscribe(move |n| {
            if let Notification::StateChanged(state) = n {
                callback(*state);
            }
        })
    }

    /// Subscribe to background colour updates only.
    pub fn on_background_change<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&str) + 'static,
    {
        self.subscribe(move |n| {
            if let Notification::BackgroundChanged(color) = n {
                callback(color);
            }
        })
    }

    /// Subscribe to instance creation only.
    pub fn on_instance_saved<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&AnimationInstance) + 'static,
    {
        self.subscribe(move |n| {
            if let Notification::InstanceSaved(instance) = n {
                callback(instance);
            }
        })
    }

    /// Returns `true` when a listener was removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        before != self.listeners.len()
    }

    /// Invoke listeners, then queue for deferred processing.
    pub fn emit(&mut self, notification: Notification) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&notification);
        }

        if self.queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = self.queue.len() / 2;
            warn!(
                "EventBus queue full ({} notifications), evicting oldest {}",
                self.queue.len(),
                evict_count
            );
            self.queue.drain(0..evict_count);
        }
        self.queue.push(notification);
    }

    /// Take all notifications queued since the last poll.
    pub fn poll(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }
}
