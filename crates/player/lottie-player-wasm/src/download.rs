use log::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlAnchorElement;

use lottie_player::Downloader;

use crate::js::describe;

/// Triggers a download by clicking a detached `<a download>` element.
pub(crate) struct AnchorDownloader;

impl Downloader for AnchorDownloader {
    fn download(&mut self, data_uri: &str, filename: &str) {
        if let Err(err) = click_anchor(data_uri, filename) {
            warn!("snapshot download failed: {}", describe(&err));
        }
    }
}

fn click_anchor(href: &str, filename: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(href);
    anchor.set_download(filename);
    anchor.click();
    Ok(())
}
