//! Snapshot export.

use serde::{Deserialize, Serialize};

use crate::config::Renderer;
use crate::engine::SurfaceCapture;

const SVG_DATA_PREFIX: &str = "data:image/svg+xml;charset=utf-8,";

/// Exported image of the current frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub data_uri: String,
    pub filename: String,
}

impl Snapshot {
    /// Build a snapshot from a surface capture. Vector markup is inlined into a
    /// percent-encoded data URI; raster captures are already data URIs.
    pub fn from_capture(capture: SurfaceCapture, renderer: Renderer) -> Self {
        let data_uri = match capture {
            SurfaceCapture::Markup(markup) => {
                format!("{SVG_DATA_PREFIX}{}", encode_uri_component(&markup))
            }
            SurfaceCapture::DataUri(uri) => uri,
        };
        Self {
            data_uri,
            filename: renderer.snapshot_filename().to_string(),
        }
    }
}

/// Host hook that turns a data URI into a client-side download.
pub trait Downloader {
    fn download(&mut self, data_uri: &str, filename: &str);
}

impl<F> Downloader for F
where
    F: FnMut(&str, &str),
{
    fn download(&mut self, data_uri: &str, filename: &str) {
        self(data_uri, filename)
    }
}

/// Percent-encode with the same unreserved set as `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => {
                out.push('%');
                out.push(HEX[(byte >> 4) as usize] as char);
                out.push(HEX[(byte & 0x0f) as usize] as char);
            }
        }
    }
    out
}
