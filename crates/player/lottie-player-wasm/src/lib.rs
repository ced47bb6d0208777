use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Function;
use log::{warn, LevelFilter};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use lottie_player::{
    Direction, HostEnvironment, LoadProgress, Notification, PlayerConfig, PlayerController,
    PointerInput, SourceDescriptor,
};

mod download;
mod engine;
mod fetch;
mod js;
mod logger;

pub use engine::JsEngine;

use download::AnchorDownloader;
use engine::Wake;
use fetch::FetchInbox;
use js::{call_method, describe, is_nullish, to_js};

/// Host callbacks registered from JS.
#[derive(Clone, Default)]
pub(crate) struct HostCallbacks {
    on_event: Option<Function>,
    on_state_change: Option<Function>,
    on_background_change: Option<Function>,
    on_instance_saved: Option<Function>,
    on_seeker_change: Option<Function>,
}

impl HostCallbacks {
    fn dispatch(&self, notification: &Notification) {
        let (callback, arg) = match notification {
            Notification::Event(event) => (&self.on_event, to_js(event)),
            Notification::StateChanged(state) => {
                (&self.on_state_change, Ok(JsValue::from_str(state.name())))
            }
            Notification::BackgroundChanged(css) => {
                (&self.on_background_change, Ok(JsValue::from_str(css)))
            }
            Notification::InstanceSaved(instance) => (&self.on_instance_saved, to_js(instance)),
            Notification::SeekerChanged(frame) => {
                (&self.on_seeker_change, Ok(JsValue::from(*frame)))
            }
        };
        let Some(callback) = callback else {
            return;
        };
        match arg {
            Ok(arg) => {
                if let Err(err) = callback.call1(&JsValue::UNDEFINED, &arg) {
                    warn!("host callback threw: {}", describe(&err));
                }
            }
            Err(err) => warn!("could not convert notification: {err}"),
        }
    }
}

pub(crate) struct Shared {
    pub(crate) controller: PlayerController<JsEngine>,
    callbacks: HostCallbacks,
    inbox: Rc<FetchInbox>,
    flushing: Rc<Cell<bool>>,
}

/// Apply parked fetch results, pump engine signals and hand queued
/// notifications to the host callbacks.
/// The controller is never borrowed while a callback runs, so callbacks may
/// call back into the player. A flush started from inside a callback returns
/// at once; the outer loop delivers whatever it queued, in emission order.
pub(crate) fn flush(shared: &Rc<RefCell<Shared>>) {
    let flushing = match shared.try_borrow() {
        Ok(inner) => Rc::clone(&inner.flushing),
        Err(_) => return,
    };
    if flushing.replace(true) {
        return;
    }
    loop {
        let (notifications, callbacks) = match shared.try_borrow_mut() {
            Ok(mut inner) => {
                let parked = inner.inbox.drain();
                for (ticket, result) in parked {
                    inner.controller.complete_fetch(ticket, result);
                }
                inner.controller.pump_engine_events();
                (inner.controller.poll_notifications(), inner.callbacks.clone())
            }
            Err(_) => break,
        };
        if notifications.is_empty() {
            break;
        }
        for notification in &notifications {
            callbacks.dispatch(notification);
        }
    }
    flushing.set(false);
}

/// Engine listeners fire from inside lottie's own callbacks; the flush runs
/// on the next microtask so no listener is removed while it is executing.
fn microtask_wake(slot: Rc<RefCell<Weak<RefCell<Shared>>>>) -> Wake {
    let scheduled = Rc::new(Cell::new(false));
    Rc::new(move || {
        if scheduled.replace(true) {
            return;
        }
        let slot = Rc::clone(&slot);
        let scheduled = Rc::clone(&scheduled);
        let task = Closure::once_into_js(move || {
            scheduled.set(false);
            let target = slot.borrow().upgrade();
            if let Some(shared) = target {
                flush(&shared);
            }
        });
        let resolved = js_sys::Promise::resolve(&JsValue::UNDEFINED);
        if let Err(err) = call_method(&resolved, "then", &[task]) {
            warn!("could not schedule flush: {}", describe(&err));
        }
    })
}

fn detect_environment() -> HostEnvironment {
    let Some(window) = web_sys::window() else {
        return HostEnvironment::default();
    };
    let prefers_dark = window
        .match_media("(prefers-color-scheme: dark)")
        .ok()
        .flatten()
        .map(|query| query.matches())
        .unwrap_or(false);
    let base_url = window.document().and_then(|d| d.url().ok());
    HostEnvironment {
        prefers_dark,
        base_url,
    }
}

fn source_from_js(src: JsValue) -> Result<SourceDescriptor, JsError> {
    if let Some(text) = src.as_string() {
        return Ok(SourceDescriptor::Text(text));
    }
    let value: serde_json::Value =
        swb::from_value(src).map_err(|e| JsError::new(&format!("src error: {e}")))?;
    Ok(SourceDescriptor::from(value))
}

#[wasm_bindgen]
pub struct LottiePlayer {
    shared: Rc<RefCell<Shared>>,
    inbox: Rc<FetchInbox>,
}

impl LottiePlayer {
    fn with<R>(&self, f: impl FnOnce(&mut PlayerController<JsEngine>) -> R) -> Result<R, JsError> {
        let out = {
            let mut inner = self
                .shared
                .try_borrow_mut()
                .map_err(|_| JsError::new("player is busy"))?;
            f(&mut inner.controller)
        };
        flush(&self.shared);
        Ok(out)
    }

    fn follow(&self, progress: LoadProgress) {
        let LoadProgress::AwaitingFetch(request) = progress else {
            return;
        };
        fetch::spawn_fetch(Rc::clone(&self.inbox), request);
    }

    fn callbacks(&self) -> Result<std::cell::RefMut<'_, HostCallbacks>, JsError> {
        self.shared
            .try_borrow_mut()
            .map(|inner| std::cell::RefMut::map(inner, |i| &mut i.callbacks))
            .map_err(|_| JsError::new("player is busy"))
    }
}

#[wasm_bindgen]
impl LottiePlayer {
    /// Create a player around an injected lottie-web module.
    ///
    /// `config` is the camelCase options object (or undefined for defaults).
    /// `env` overrides detected host facts: `{ prefersDark, baseUrl }`.
    ///
    ///   import lottie from "lottie-web";
    ///   const player = new LottiePlayer(lottie, { src: "anim.json", loop: true });
    ///   player.mount();
    #[wasm_bindgen(constructor)]
    pub fn new(lottie: JsValue, config: JsValue, env: JsValue) -> Result<LottiePlayer, JsError> {
        console_error_panic_hook::set_once();
        logger::init(LevelFilter::Warn);

        if is_nullish(&lottie) {
            return Err(JsError::new("a lottie module is required"));
        }
        let cfg: PlayerConfig = if is_nullish(&config) {
            PlayerConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        let env: HostEnvironment = if is_nullish(&env) {
            detect_environment()
        } else {
            swb::from_value(env).map_err(|e| JsError::new(&format!("env error: {e}")))?
        };

        let slot = Rc::new(RefCell::new(Weak::new()));
        let wake = microtask_wake(Rc::clone(&slot));
        let inbox = Rc::new(FetchInbox::new(Rc::clone(&wake)));
        let engine = JsEngine::new(lottie, wake);
        let controller = PlayerController::new(engine, cfg)
            .map_err(|e| JsError::new(&e.to_string()))?
            .with_environment(env)
            .with_downloader(AnchorDownloader);

        let shared = Rc::new(RefCell::new(Shared {
            controller,
            callbacks: HostCallbacks::default(),
            inbox: Rc::clone(&inbox),
            flushing: Rc::new(Cell::new(false)),
        }));
        *slot.borrow_mut() = Rc::downgrade(&shared);
        Ok(LottiePlayer { shared, inbox })
    }

    // ----- lifecycle -----

    /// Load the configured `src`, if any.
    #[wasm_bindgen]
    pub fn mount(&self) -> Result<(), JsError> {
        let progress = self.with(|c| c.mount())?;
        self.follow(progress);
        Ok(())
    }

    /// Destroy the animation; pending fetches are ignored when they land.
    #[wasm_bindgen]
    pub fn unmount(&self) -> Result<(), JsError> {
        self.with(|c| c.unmount())
    }

    /// Load a new source: an animation object, JSON text or a URL.
    #[wasm_bindgen]
    pub fn load(&self, src: JsValue) -> Result<(), JsError> {
        let source = source_from_js(src)?;
        let progress = self.with(|c| c.load(source))?;
        self.follow(progress);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn reload(&self) -> Result<(), JsError> {
        let progress = self.with(|c| c.reload())?;
        self.follow(progress);
        Ok(())
    }

    /// Deliver engine events queued since the last call.
    #[wasm_bindgen]
    pub fn pump(&self) -> Result<(), JsError> {
        self.with(|_| ())
    }

    // ----- commands -----

    #[wasm_bindgen]
    pub fn play(&self) -> Result<(), JsError> {
        self.with(|c| c.play())
    }

    #[wasm_bindgen]
    pub fn pause(&self) -> Result<(), JsError> {
        self.with(|c| c.pause())
    }

    #[wasm_bindgen]
    pub fn stop(&self) -> Result<(), JsError> {
        self.with(|c| c.stop())
    }

    #[wasm_bindgen(js_name = set_seeker)]
    pub fn set_seeker(&self, frame: u32, play: Option<bool>) -> Result<(), JsError> {
        self.with(|c| c.set_seeker(frame, play.unwrap_or(false)))
    }

    #[wasm_bindgen(js_name = set_loop)]
    pub fn set_loop(&self, looping: bool) -> Result<(), JsError> {
        self.with(|c| c.set_loop(looping))
    }

    #[wasm_bindgen(js_name = set_speed)]
    pub fn set_speed(&self, speed: f64) -> Result<(), JsError> {
        self.with(|c| c.set_speed(speed))?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// `1` forward, `-1` reverse.
    #[wasm_bindgen(js_name = set_direction)]
    pub fn set_direction(&self, direction: i8) -> Result<(), JsError> {
        let direction = Direction::try_from(direction).map_err(|e| JsError::new(&e))?;
        self.with(|c| c.set_direction(direction))
    }

    #[wasm_bindgen(js_name = set_background)]
    pub fn set_background(&self, color: &str) -> Result<(), JsError> {
        self.with(|c| c.set_background(color))?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// `{ dataUri, filename }` or null when nothing is rendered yet.
    /// Downloads the image unless `download` is false.
    #[wasm_bindgen]
    pub fn snapshot(&self, download: Option<bool>) -> Result<JsValue, JsError> {
        match self.with(|c| c.snapshot(download.unwrap_or(true)))? {
            Some(snapshot) => to_js(&snapshot).map_err(|e| JsError::new(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    /// Forward `"enter"`, `"leave"` or `"click"` from the container.
    #[wasm_bindgen(js_name = handle_pointer)]
    pub fn handle_pointer(&self, input: &str) -> Result<(), JsError> {
        let input = match input {
            "enter" => PointerInput::Enter,
            "leave" => PointerInput::Leave,
            "click" => PointerInput::Click,
            other => return Err(JsError::new(&format!("unknown pointer input '{other}'"))),
        };
        self.with(|c| c.handle_pointer(input))
    }

    // ----- observation -----

    #[wasm_bindgen]
    pub fn state(&self) -> Result<String, JsError> {
        self.with(|c| c.state().name().to_string())
    }

    #[wasm_bindgen]
    pub fn seeker(&self) -> Result<u32, JsError> {
        self.with(|c| c.seeker())
    }

    /// Everything the control surface renders from.
    #[wasm_bindgen]
    pub fn view(&self) -> Result<JsValue, JsError> {
        let view = self.with(|c| c.view())?;
        to_js(&view).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Read-only description of the live animation, or null.
    #[wasm_bindgen]
    pub fn instance(&self) -> Result<JsValue, JsError> {
        match self.with(|c| c.instance().cloned())? {
            Some(instance) => to_js(&instance).map_err(|e| JsError::new(&e.to_string())),
            None => Ok(JsValue::NULL),
        }
    }

    /// Reason for the last failed load, if any.
    #[wasm_bindgen(js_name = last_error)]
    pub fn last_error(&self) -> Result<Option<String>, JsError> {
        self.with(|c| c.last_error().map(|e| e.to_string()))
    }

    #[wasm_bindgen(js_name = on_event)]
    pub fn on_event(&self, callback: Option<Function>) -> Result<(), JsError> {
        self.callbacks()?.on_event = callback;
        Ok(())
    }

    #[wasm_bindgen(js_name = on_state_change)]
    pub fn on_state_change(&self, callback: Option<Function>) -> Result<(), JsError> {
        self.callbacks()?.on_state_change = callback;
        Ok(())
    }

    #[wasm_bindgen(js_name = on_background_change)]
    pub fn on_background_change(&self, callback: Option<Function>) -> Result<(), JsError> {
        self.callbacks()?.on_background_change = callback;
        Ok(())
    }

    /// Receives the read-only instance description whenever a new
    /// animation is created.
    #[wasm_bindgen(js_name = on_instance_saved)]
    pub fn on_instance_saved(&self, callback: Option<Function>) -> Result<(), JsError> {
        self.callbacks()?.on_instance_saved = callback;
        Ok(())
    }

    #[wasm_bindgen(js_name = on_seeker_change)]
    pub fn on_seeker_change(&self, callback: Option<Function>) -> Result<(), JsError> {
        self.callbacks()?.on_seeker_change = callback;
        Ok(())
    }
}

/// Adjust console log verbosity: `off`, `error`, `warn`, `info`, `debug`, `trace`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsError> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| JsError::new(&format!("unknown log level '{level}'")))?;
    logger::init(level);
    Ok(())
}

/// ABI guard for JS wrappers.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
