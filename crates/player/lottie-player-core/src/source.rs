//! Source descriptor resolution.
//!
//! A source is tried in a fixed order and the first success wins:
//! structured data, then JSON text, then a URL to fetch. Text that parses as
//! JSON is never reinterpreted as a URL, even when the JSON turns out not to
//! be an animation document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::AnimationData;
use crate::error::{FetchError, LoadError};

/// Host-supplied value identifying the animation to load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceDescriptor {
    /// JSON text or a URL string
    Text(String),
    /// Inline structured data
    Data(Value),
}

impl From<&str> for SourceDescriptor {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SourceDescriptor {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Value> for SourceDescriptor {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Data(other),
        }
    }
}

/// An absolute URL accepted as a fetch target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceUrl(String);

impl SourceUrl {
    /// Accept an absolute URL, or a reference relative to `base` when one is
    /// known. Returns `None` for anything else.
    pub fn parse(text: &str, base: Option<&str>) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }
        if split_scheme(text).is_some() {
            return Some(Self(text.to_string()));
        }
        let base = base.filter(|b| split_scheme(b).is_some())?;
        Some(Self(join_relative(base, text)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns `(scheme, rest)` when `text` starts with a valid RFC 3986 scheme
/// followed by a non-empty remainder.
fn split_scheme(text: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = text.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    if rest.is_empty() {
        return None;
    }
    Some((scheme, rest))
}

fn join_relative(base: &str, reference: &str) -> String {
    let Some((scheme, rest)) = split_scheme(base) else {
        return reference.to_string();
    };
    if let Some(stripped) = reference.strip_prefix("//") {
        return format!("{scheme}://{stripped}");
    }
    // Drop query and fragment from the base before resolving.
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let (authority, path) = match rest.strip_prefix("//") {
        Some(after) => match after.find('/') {
            Some(idx) => (&after[..idx], &after[idx..]),
            None => (after, "/"),
        },
        None => ("", rest),
    };
    let origin = if authority.is_empty() {
        format!("{scheme}:")
    } else {
        format!("{scheme}://{authority}")
    };
    let (ref_path, suffix) = match reference.find(['?', '#']) {
        Some(idx) => reference.split_at(idx),
        None => (reference, ""),
    };
    let merged = if ref_path.starts_with('/') {
        ref_path.to_string()
    } else {
        let dir = match path.rfind('/') {
            Some(idx) => &path[..=idx],
            None => "/",
        };
        format!("{dir}{ref_path}")
    };
    format!("{origin}{}{suffix}", remove_dot_segments(&merged))
}

/// Collapse `.` and `..` segments of an absolute path (RFC 3986 5.2.4).
fn remove_dot_segments(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "." => {
                if i == last {
                    out.push("");
                }
            }
            ".." => {
                out.pop();
                if i == last {
                    out.push("");
                }
            }
            other => out.push(other),
        }
    }
    format!("/{}", out.join("/"))
}

/// Outcome of resolving a descriptor without performing any I/O.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Data is available immediately
    Ready(AnimationData),
    /// Data must be fetched from the URL
    Fetch(SourceUrl),
}

/// Resolve a descriptor as structured data, then JSON text, then URL.
pub fn resolve_source(
    source: &SourceDescriptor,
    base_url: Option<&str>,
) -> Result<Resolution, LoadError> {
    match source {
        SourceDescriptor::Data(value) => AnimationData::from_value(value.clone()).map(Resolution::Ready),
        SourceDescriptor::Text(text) => {
            if let Ok(value) = serde_json::from_str::<Value>(text) {
                return AnimationData::from_value(value).map(Resolution::Ready);
            }
            SourceUrl::parse(text, base_url)
                .map(Resolution::Fetch)
                .ok_or_else(|| LoadError::Resolution {
                    reason: format!("'{}' is neither JSON nor a URL", truncate(text, 64)),
                })
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Response delivered for a URL source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check the status and decode the body.
    pub fn into_animation(self, url: &SourceUrl) -> Result<AnimationData, LoadError> {
        if !self.is_success() {
            return Err(LoadError::Fetch {
                url: url.to_string(),
                source: FetchError::Status {
                    status: self.status,
                },
            });
        }
        AnimationData::from_body(&self.body)
    }
}

/// Blocking transport used by [`crate::PlayerController::load_with`].
pub trait Fetcher {
    fn fetch(&mut self, url: &SourceUrl) -> Result<FetchResponse, FetchError>;
}

impl<F> Fetcher for F
where
    F: FnMut(&SourceUrl) -> Result<FetchResponse, FetchError>,
{
    fn fetch(&mut self, url: &SourceUrl) -> Result<FetchResponse, FetchError> {
        self(url)
    }
}
