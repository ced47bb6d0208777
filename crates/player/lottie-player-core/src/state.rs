use serde::{Deserialize, Serialize};

/// Externally observable playback state of a player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No animation handle exists yet for the current source
    #[default]
    Loading,
    /// Animation is playing
    Playing,
    /// Animation is paused on a frame
    Paused,
    /// Animation is stopped
    Stopped,
    /// Loading failed; terminal until a new load is requested
    Error,
}

impl PlaybackState {
    /// Get the name of this playback state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Load has settled (successfully or not)
    #[inline]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Playback commands are honoured in this state
    #[inline]
    pub fn accepts_commands(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused | Self::Stopped)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
