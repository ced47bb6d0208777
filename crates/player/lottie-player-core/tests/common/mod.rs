#![allow(dead_code)]
//! Shared harness: an engine adapter that records every call and lets tests
//! fire engine events, plus helpers to record what observers see.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lottie_player::{
    AnimationHandle, Direction, EngineAdapter, EngineError, EngineEvent, EngineEventKind,
    EngineEventSender, FetchError, FetchResponse, Fetcher, HandleAllocator, ListenerToken,
    LoadRequest, Notification, PlaybackState, PlayerConfig, PlayerController, PlayerEvent,
    SourceUrl, SurfaceCapture,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Load { container: String, autoplay: bool },
    Destroy(AnimationHandle),
    Play(AnimationHandle),
    Pause(AnimationHandle),
    Stop(AnimationHandle),
    GoTo(AnimationHandle, f64, bool),
    Speed(AnimationHandle, f64),
    Direction(AnimationHandle, Direction),
    Loop(AnimationHandle, bool),
}

#[derive(Default, Debug)]
pub struct EngineLog {
    pub calls: Vec<Call>,
    pub loads: usize,
    pub destroys: usize,
    pub live: Vec<AnimationHandle>,
    listeners: HashMap<ListenerToken, (AnimationHandle, EngineEventKind, EngineEventSender)>,
    ids: HandleAllocator,
    pub fail_next_load: Option<String>,
    pub reported_frames: Option<f64>,
    pub capture: Option<SurfaceCapture>,
}

impl EngineLog {
    pub fn listener_count(&self, handle: AnimationHandle) -> usize {
        self.listeners
            .values()
            .filter(|(h, _, _)| *h == handle)
            .count()
    }
}

/// Engine double. Clones share one log so tests can inspect it while the
/// controller owns the adapter.
#[derive(Clone, Default, Debug)]
pub struct RecordingEngine {
    pub log: Rc<RefCell<EngineLog>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` through every listener registered for its kind on
    /// `handle`, the way the native engine would.
    pub fn emit(&self, handle: AnimationHandle, event: EngineEvent) {
        let log = self.log.borrow();
        let mut sinks: Vec<_> = log
            .listeners
            .iter()
            .filter(|(_, (h, kind, _))| *h == handle && *kind == event.kind())
            .collect();
        sinks.sort_by_key(|(token, _)| token.0);
        for (_, (_, _, sink)) in sinks {
            sink.send(handle, event.clone());
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().calls.clear();
    }

    /// `load` minus `destroy` call counts.
    pub fn outstanding(&self) -> isize {
        let log = self.log.borrow();
        log.loads as isize - log.destroys as isize
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl EngineAdapter for RecordingEngine {
    fn load(&mut self, request: LoadRequest<'_>) -> Result<AnimationHandle, EngineError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(Call::Load {
            container: request.container.to_string(),
            autoplay: request.config.autoplay,
        });
        if let Some(reason) = log.fail_next_load.take() {
            return Err(EngineError::new(reason));
        }
        log.loads += 1;
        let handle = log.ids.alloc_handle();
        log.live.push(handle);
        Ok(handle)
    }

    fn destroy(&mut self, handle: AnimationHandle) {
        let mut log = self.log.borrow_mut();
        log.calls.push(Call::Destroy(handle));
        log.destroys += 1;
        log.live.retain(|h| *h != handle);
    }

    fn play(&mut self, handle: AnimationHandle) {
        self.record(Call::Play(handle));
    }

    fn pause(&mut self, handle: AnimationHandle) {
        self.record(Call::Pause(handle));
    }

    fn stop(&mut self, handle: AnimationHandle) {
        self.record(Call::Stop(handle));
    }

    fn go_to(&mut self, handle: AnimationHandle, frame: f64, resume_playing: bool) {
        self.record(Call::GoTo(handle, frame, resume_playing));
    }

    fn set_speed(&mut self, handle: AnimationHandle, speed: f64) {
        self.record(Call::Speed(handle, speed));
    }

    fn set_direction(&mut self, handle: AnimationHandle, direction: Direction) {
        self.record(Call::Direction(handle, direction));
    }

    fn set_loop(&mut self, handle: AnimationHandle, looping: bool) {
        self.record(Call::Loop(handle, looping));
    }

    fn subscribe(
        &mut self,
        handle: AnimationHandle,
        kind: EngineEventKind,
        sink: EngineEventSender,
    ) -> ListenerToken {
        let mut log = self.log.borrow_mut();
        let token = log.ids.alloc_token();
        log.listeners.insert(token, (handle, kind, sink));
        token
    }

    fn unsubscribe(&mut self, _handle: AnimationHandle, token: ListenerToken) {
        self.log.borrow_mut().listeners.remove(&token);
    }

    fn total_frames(&self, _handle: AnimationHandle) -> Option<f64> {
        self.log.borrow().reported_frames
    }

    fn capture(&self, _handle: AnimationHandle) -> Option<SurfaceCapture> {
        self.log.borrow().capture.clone()
    }
}

/// Fetcher answering from a fixed table; unknown URLs are 404s.
#[derive(Default, Debug)]
pub struct StaticFetcher {
    pub routes: HashMap<String, FetchResponse>,
    pub requests: Vec<String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, response: FetchResponse) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&mut self, url: &SourceUrl) -> Result<FetchResponse, FetchError> {
        self.requests.push(url.to_string());
        Ok(self
            .routes
            .get(url.as_str())
            .cloned()
            .unwrap_or(FetchResponse {
                status: 404,
                body: "not found".into(),
            }))
    }
}

/// Everything delivered to subscribed listeners, in order.
#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Rc<RefCell<Vec<Notification>>>,
}

impl Recorder {
    pub fn attach(controller: &mut PlayerController<RecordingEngine>) -> Self {
        let recorder = Self::default();
        let seen = Rc::clone(&recorder.seen);
        controller
            .events()
            .subscribe(move |n| seen.borrow_mut().push(n.clone()));
        recorder
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::StateChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Event(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &PlayerEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

pub const MINIMAL: &str = r#"{"v":"5.5.0","layers":[]}"#;

pub fn controller(config: PlayerConfig) -> (PlayerController<RecordingEngine>, RecordingEngine) {
    let engine = RecordingEngine::new();
    let controller = PlayerController::new(engine.clone(), config).unwrap();
    (controller, engine)
}

/// Controller with `MINIMAL` loaded and settled.
pub fn loaded(config: PlayerConfig) -> (PlayerController<RecordingEngine>, RecordingEngine) {
    let (mut controller, engine) = controller(config);
    controller.load(MINIMAL);
    (controller, engine)
}
