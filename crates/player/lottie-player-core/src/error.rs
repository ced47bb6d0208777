//! Error types for the playback controller

use serde::{Deserialize, Serialize};

/// Failure while turning a source descriptor into loaded animation data.
///
/// All variants collapse onto the public `Error` playback state; the variant
/// itself is kept for diagnostics only.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum LoadError {
    /// Source is neither structured data, JSON text, nor a URL
    #[error("Source could not be resolved: {reason}")]
    Resolution { reason: String },

    /// Network or transport failure while retrieving a URL source
    #[error("Fetch failed for {url}: {source}")]
    Fetch { url: String, source: FetchError },

    /// Body or inline data is not a valid animation document
    #[error("Animation data could not be decoded: {reason}")]
    Decode { reason: String },

    /// The engine rejected the data or reported `data_failed`
    #[error("Engine failed to load animation: {reason}")]
    EngineLoad { reason: String },
}

impl LoadError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "resolution",
            Self::Fetch { .. } => "fetch",
            Self::Decode { .. } => "decode",
            Self::EngineLoad { .. } => "engine",
        }
    }
}

/// Transport-level failure reported by a [`crate::Fetcher`] or the host.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FetchError {
    /// Request never produced a response
    #[error("network error: {reason}")]
    Network { reason: String },

    /// Response arrived with a non-success status
    #[error("HTTP status {status}")]
    Status { status: u16 },
}

impl FetchError {
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }
}

/// Errors returned to callers of the controller API.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerError {
    /// Speed must be finite and strictly positive
    #[error("Invalid speed: {speed}")]
    InvalidSpeed { speed: f64 },

    /// Background colour could not be parsed
    #[error("Invalid colour: {value}")]
    InvalidColor { value: String },

    /// Configuration could not be deserialised or failed validation
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Loading failed
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl PlayerError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidSpeed { .. } | Self::InvalidColor { .. } => "validation",
            Self::InvalidConfig { .. } => "config",
            Self::Load(inner) => inner.category(),
        }
    }
}

impl From<serde_json::Error> for PlayerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
