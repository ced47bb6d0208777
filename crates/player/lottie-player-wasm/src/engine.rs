//! [`EngineAdapter`] over an injected lottie-web module.
//!
//! The module object is handed in by the host (`import lottie from
//! "lottie-web"`); nothing is read from or written to `window`. Animation
//! items returned by `loadAnimation` are kept private and are never patched.

use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use lottie_player::{
    AnimationHandle, Direction, EngineAdapter, EngineError, EngineEvent, EngineEventKind,
    EngineEventSender, HandleAllocator, ListenerToken, LoadRequest, Renderer, SurfaceCapture,
};

use crate::js::{call_method, describe, get_path, is_nullish, set_prop, to_js};

/// Invoked after an engine listener queued a signal.
pub(crate) type Wake = Rc<dyn Fn()>;

struct Item {
    item: JsValue,
    renderer: Renderer,
}

struct Listener {
    handle: AnimationHandle,
    kind: EngineEventKind,
    callback: Closure<dyn FnMut(JsValue)>,
}

pub struct JsEngine {
    module: JsValue,
    ids: HandleAllocator,
    items: HashMap<AnimationHandle, Item>,
    listeners: HashMap<ListenerToken, Listener>,
    wake: Wake,
}

impl JsEngine {
    pub(crate) fn new(module: JsValue, wake: Wake) -> Self {
        Self {
            module,
            ids: HandleAllocator::new(),
            items: HashMap::new(),
            listeners: HashMap::new(),
            wake,
        }
    }

    fn invoke(&self, handle: AnimationHandle, method: &str, args: &[JsValue]) {
        let Some(entry) = self.items.get(&handle) else {
            debug!("{method} on unknown handle {handle:?}");
            return;
        };
        if let Err(err) = call_method(&entry.item, method, args) {
            warn!("lottie {method} failed: {}", describe(&err));
        }
    }

    fn build_params(&self, request: &LoadRequest<'_>) -> Result<JsValue, EngineError> {
        let container = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(request.container))
            .ok_or_else(|| {
                EngineError::new(format!("container '#{}' not found", request.container))
            })?;
        let data = to_js(request.data)
            .map_err(|e| EngineError::new(format!("animation data: {e}")))?;
        let settings = to_js(&request.config.renderer_settings)
            .map_err(|e| EngineError::new(format!("renderer settings: {e}")))?;

        let params: JsValue = Object::new().into();
        let fields = [
            ("container", JsValue::from(container)),
            ("renderer", JsValue::from_str(request.config.renderer.name())),
            ("loop", JsValue::from_bool(request.config.looping)),
            // Playback is started by the controller once the handle is wired up.
            ("autoplay", JsValue::FALSE),
            ("animationData", data),
            ("rendererSettings", settings),
        ];
        for (key, value) in fields.iter() {
            set_prop(&params, key, value).map_err(|e| EngineError::new(describe(&e)))?;
        }
        Ok(params)
    }
}

fn translate(kind: EngineEventKind, payload: &JsValue) -> EngineEvent {
    match kind {
        EngineEventKind::FrameAdvance => EngineEvent::FrameAdvance {
            current_frame: Reflect::get(payload, &JsValue::from_str("currentTime"))
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0),
        },
        EngineEventKind::ReadyToRender => EngineEvent::ReadyToRender,
        EngineEventKind::DataReady => EngineEvent::DataReady,
        EngineEventKind::DataFailed => EngineEvent::DataFailed {
            reason: get_path(payload, &["message"]).and_then(|v| v.as_string()),
        },
        EngineEventKind::LoopComplete => EngineEvent::LoopComplete,
        EngineEventKind::PlaybackComplete => EngineEvent::PlaybackComplete,
    }
}

impl EngineAdapter for JsEngine {
    fn load(&mut self, request: LoadRequest<'_>) -> Result<AnimationHandle, EngineError> {
        let params = self.build_params(&request)?;
        let item = call_method(&self.module, "loadAnimation", &[params])
            .map_err(|e| EngineError::new(describe(&e)))?;
        if is_nullish(&item) {
            return Err(EngineError::new("loadAnimation returned no animation"));
        }
        let handle = self.ids.alloc_handle();
        self.items.insert(
            handle,
            Item {
                item,
                renderer: request.config.renderer,
            },
        );
        Ok(handle)
    }

    fn destroy(&mut self, handle: AnimationHandle) {
        let stale: Vec<ListenerToken> = self
            .listeners
            .iter()
            .filter(|(_, l)| l.handle == handle)
            .map(|(token, _)| *token)
            .collect();
        for token in stale {
            self.unsubscribe(handle, token);
        }
        self.invoke(handle, "destroy", &[]);
        self.items.remove(&handle);
    }

    fn play(&mut self, handle: AnimationHandle) {
        self.invoke(handle, "play", &[]);
    }

    fn pause(&mut self, handle: AnimationHandle) {
        self.invoke(handle, "pause", &[]);
    }

    fn stop(&mut self, handle: AnimationHandle) {
        self.invoke(handle, "stop", &[]);
    }

    fn go_to(&mut self, handle: AnimationHandle, frame: f64, resume_playing: bool) {
        let method = if resume_playing {
            "goToAndPlay"
        } else {
            "goToAndStop"
        };
        self.invoke(handle, method, &[JsValue::from_f64(frame), JsValue::TRUE]);
    }

    fn set_speed(&mut self, handle: AnimationHandle, speed: f64) {
        self.invoke(handle, "setSpeed", &[JsValue::from_f64(speed)]);
    }

    fn set_direction(&mut self, handle: AnimationHandle, direction: Direction) {
        self.invoke(
            handle,
            "setDirection",
            &[JsValue::from_f64(direction.value() as f64)],
        );
    }

    fn set_loop(&mut self, handle: AnimationHandle, looping: bool) {
        self.invoke(handle, "setLoop", &[JsValue::from_bool(looping)]);
    }

    fn subscribe(
        &mut self,
        handle: AnimationHandle,
        kind: EngineEventKind,
        sink: EngineEventSender,
    ) -> ListenerToken {
        let token = self.ids.alloc_token();
        let wake = Rc::clone(&self.wake);
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            sink.send(handle, translate(kind, &payload));
            wake();
        });
        self.invoke(
            handle,
            "addEventListener",
            &[
                JsValue::from_str(kind.native_name()),
                callback.as_ref().clone(),
            ],
        );
        self.listeners.insert(
            token,
            Listener {
                handle,
                kind,
                callback,
            },
        );
        token
    }

    fn unsubscribe(&mut self, handle: AnimationHandle, token: ListenerToken) {
        let Some(listener) = self.listeners.remove(&token) else {
            return;
        };
        self.invoke(
            handle,
            "removeEventListener",
            &[
                JsValue::from_str(listener.kind.native_name()),
                listener.callback.as_ref().clone(),
            ],
        );
    }

    fn total_frames(&self, handle: AnimationHandle) -> Option<f64> {
        let entry = self.items.get(&handle)?;
        get_path(&entry.item, &["totalFrames"])?.as_f64()
    }

    fn capture(&self, handle: AnimationHandle) -> Option<SurfaceCapture> {
        let entry = self.items.get(&handle)?;
        match entry.renderer {
            Renderer::Svg => {
                let svg: web_sys::Node = get_path(&entry.item, &["renderer", "svgElement"])?
                    .dyn_into()
                    .ok()?;
                let markup = web_sys::XmlSerializer::new()
                    .ok()?
                    .serialize_to_string(&svg)
                    .ok()?;
                Some(SurfaceCapture::Markup(markup))
            }
            Renderer::Canvas => {
                let canvas: web_sys::HtmlCanvasElement =
                    get_path(&entry.item, &["renderer", "canvasContext", "canvas"])?
                        .dyn_into()
                        .ok()?;
                canvas.to_data_url().ok().map(SurfaceCapture::DataUri)
            }
        }
    }
}
