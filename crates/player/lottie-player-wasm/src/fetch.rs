//! URL sources fetched with `window.fetch`.
//!
//! The controller hands out a [`FetchRequest`]; the response (or failure) is
//! parked in the player's [`FetchInbox`] with the same ticket and applied on
//! the next flush. A superseded request is dropped by the controller rather
//! than here.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use lottie_player::{FetchError, FetchRequest, FetchResponse, LoadTicket};

use crate::engine::Wake;
use crate::js::{call_method, describe};

pub(crate) type FetchOutcome = (LoadTicket, Result<FetchResponse, FetchError>);

/// Completed fetches waiting for the controller to be free.
pub(crate) struct FetchInbox {
    results: RefCell<Vec<FetchOutcome>>,
    wake: Wake,
}

impl FetchInbox {
    pub(crate) fn new(wake: Wake) -> Self {
        Self {
            results: RefCell::new(Vec::new()),
            wake,
        }
    }

    /// Take every parked result, oldest first.
    pub(crate) fn drain(&self) -> Vec<FetchOutcome> {
        std::mem::take(&mut *self.results.borrow_mut())
    }

    pub(crate) fn deliver(&self, ticket: LoadTicket, result: Result<FetchResponse, FetchError>) {
        self.results.borrow_mut().push((ticket, result));
        (self.wake)();
    }
}

type Inbox = Rc<FetchInbox>;

pub(crate) fn spawn_fetch(inbox: Inbox, request: FetchRequest) {
    let FetchRequest { ticket, url } = request;
    let Some(window) = web_sys::window() else {
        inbox.deliver(ticket, Err(FetchError::network("no window to fetch with")));
        return;
    };
    debug!("fetching {url}");
    let promise = window.fetch_with_str(url.as_str());

    let on_response = {
        let inbox = inbox.clone();
        Closure::once_into_js(move |response: JsValue| read_body(inbox, ticket, response))
    };
    let on_error = {
        let inbox = inbox.clone();
        Closure::once_into_js(move |err: JsValue| {
            inbox.deliver(ticket, Err(FetchError::network(describe(&err))))
        })
    };
    if let Err(err) = call_method(&promise, "then", &[on_response, on_error]) {
        inbox.deliver(ticket, Err(FetchError::network(describe(&err))));
    }
}

fn read_body(inbox: Inbox, ticket: LoadTicket, response: JsValue) {
    let response: web_sys::Response = match response.dyn_into() {
        Ok(response) => response,
        Err(other) => {
            let reason = format!("unexpected fetch result: {}", describe(&other));
            inbox.deliver(ticket, Err(FetchError::network(reason)));
            return;
        }
    };
    let status = response.status();
    let text = match response.text() {
        Ok(text) => text,
        Err(err) => {
            inbox.deliver(ticket, Err(FetchError::network(describe(&err))));
            return;
        }
    };

    let on_text = {
        let inbox = inbox.clone();
        Closure::once_into_js(move |body: JsValue| {
            let body = body.as_string().unwrap_or_default();
            inbox.deliver(ticket, Ok(FetchResponse { status, body }))
        })
    };
    let on_error = {
        let inbox = inbox.clone();
        Closure::once_into_js(move |err: JsValue| {
            inbox.deliver(ticket, Err(FetchError::network(describe(&err))))
        })
    };
    if let Err(err) = call_method(&text, "then", &[on_text, on_error]) {
        inbox.deliver(ticket, Err(FetchError::network(describe(&err))));
    }
}
