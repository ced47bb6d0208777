//! Host-facing player configuration.
//!
//! `PlayerConfig` mirrors the options a host page passes when mounting the
//! widget. It deserialises from camelCase JSON so the same document can be
//! handed over from JavaScript unchanged. `PlaybackConfig` is the immutable
//! snapshot the engine receives for a single load.

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;
use crate::source::SourceDescriptor;

/// Element id used when the host does not supply one.
pub const DEFAULT_CONTAINER_ID: &str = "lottie";

/// Rendering backend requested from the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// Vector markup output
    #[default]
    #[serde(alias = "vector")]
    Svg,
    /// Raster canvas output
    #[serde(alias = "raster")]
    Canvas,
}

impl Renderer {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Canvas => "canvas",
        }
    }

    /// Filename offered when a snapshot is downloaded.
    #[inline]
    pub fn snapshot_filename(&self) -> &'static str {
        match self {
            Self::Svg => "snapshot.svg",
            Self::Canvas => "snapshot.png",
        }
    }
}

/// Playback direction, serialised as `1` / `-1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub fn value(&self) -> i8 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Reverse),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        direction.value()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Transparent,
}

impl Theme {
    /// Theme chosen when the host leaves it unspecified.
    #[inline]
    pub fn from_preference(prefers_dark: bool) -> Self {
        if prefers_dark {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

/// Control-surface buttons the host may enable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Play,
    Stop,
    Frame,
    Background,
    Repeat,
    Snapshot,
}

impl Button {
    pub const ALL: [Button; 6] = [
        Button::Play,
        Button::Stop,
        Button::Frame,
        Button::Background,
        Button::Repeat,
        Button::Snapshot,
    ];
}

fn default_buttons() -> Vec<Button> {
    Button::ALL.to_vec()
}

/// Renderer-specific settings forwarded verbatim to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererSettings {
    #[serde(default)]
    pub clear_canvas: bool,
    #[serde(default = "default_true")]
    pub hide_on_transparent: bool,
    #[serde(default = "default_true")]
    pub progressive_load: bool,
    /// Any further engine-specific keys (e.g. `preserveAspectRatio`).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_canvas: false,
            hide_on_transparent: true,
            progressive_load: true,
            extra: serde_json::Map::new(),
        }
    }
}

fn default_speed() -> f64 {
    1.0
}

/// Construction options recognised by the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub id: Option<String>,
    pub autoplay: bool,
    pub background: Option<String>,
    /// Whether the host renders the control surface
    pub controls: bool,
    pub direction: Direction,
    /// Play on pointer enter, stop on leave
    pub hover: bool,
    /// Toggle play/stop on click
    pub click: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub renderer: Renderer,
    #[serde(default = "default_speed")]
    pub speed: f64,
    pub src: Option<SourceDescriptor>,
    pub renderer_settings: Option<RendererSettings>,
    pub keep_last_frame: bool,
    #[serde(default = "default_buttons")]
    pub buttons: Vec<Button>,
    pub theme: Option<Theme>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            id: None,
            autoplay: false,
            background: None,
            controls: false,
            direction: Direction::Forward,
            hover: false,
            click: false,
            looping: false,
            renderer: Renderer::Svg,
            speed: default_speed(),
            src: None,
            renderer_settings: None,
            keep_last_frame: false,
            buttons: default_buttons(),
            theme: None,
        }
    }
}

impl PlayerConfig {
    /// Parse a camelCase JSON document and validate it.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let cfg: PlayerConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !is_valid_speed(self.speed) {
            return Err(PlayerError::InvalidSpeed { speed: self.speed });
        }
        Ok(())
    }

    /// Element id of the rendering container.
    #[inline]
    pub fn container_id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_CONTAINER_ID)
    }

    /// Explicit theme, or the host preference when unset.
    #[inline]
    pub fn resolved_theme(&self, prefers_dark: bool) -> Theme {
        self.theme
            .unwrap_or_else(|| Theme::from_preference(prefers_dark))
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            autoplay: self.autoplay,
            looping: self.looping,
            speed: self.speed,
            direction: self.direction,
            renderer: self.renderer,
            renderer_settings: self.renderer_settings.clone().unwrap_or_default(),
            keep_last_frame: self.keep_last_frame,
        }
    }
}

/// Facts about the hosting page that the controller cannot discover itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostEnvironment {
    /// Host prefers a dark colour scheme
    pub prefers_dark: bool,
    /// Document URL used to resolve relative sources
    pub base_url: Option<String>,
}

/// Snapshot of playback options handed to the engine for one load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackConfig {
    pub autoplay: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub speed: f64,
    pub direction: Direction,
    pub renderer: Renderer,
    pub renderer_settings: RendererSettings,
    pub keep_last_frame: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlayerConfig::default().playback_config()
    }
}

#[inline]
pub(crate) fn is_valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_host_expectations() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.renderer, Renderer::Svg);
        assert!(!cfg.looping);
        assert_eq!(cfg.speed, 1.0);
        assert_eq!(cfg.container_id(), "lottie");
        assert_eq!(cfg.buttons.len(), 6);
        assert_eq!(cfg.resolved_theme(true), Theme::Dark);
        assert_eq!(cfg.resolved_theme(false), Theme::Light);

        let settings = cfg.playback_config().renderer_settings;
        assert!(!settings.clear_canvas);
        assert!(settings.hide_on_transparent);
        assert!(settings.progressive_load);
    }

    #[test]
    fn parses_camel_case_document() {
        let cfg = PlayerConfig::from_json(
            r#"{
                "id": "hero",
                "autoplay": true,
                "loop": true,
                "direction": -1,
                "renderer": "raster",
                "speed": 2.5,
                "keepLastFrame": true,
                "buttons": ["play", "snapshot"],
                "theme": "transparent",
                "src": "https://example.com/anim.json",
                "rendererSettings": { "preserveAspectRatio": "xMidYMid slice" }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.container_id(), "hero");
        assert!(cfg.autoplay && cfg.looping && cfg.keep_last_frame);
        assert_eq!(cfg.direction, Direction::Reverse);
        assert_eq!(cfg.renderer, Renderer::Canvas);
        assert_eq!(cfg.buttons, vec![Button::Play, Button::Snapshot]);
        assert_eq!(cfg.resolved_theme(true), Theme::Transparent);
        assert!(matches!(cfg.src, Some(SourceDescriptor::Text(_))));

        let settings = cfg.renderer_settings.unwrap();
        assert!(settings.progressive_load);
        assert_eq!(
            settings.extra.get("preserveAspectRatio"),
            Some(&serde_json::json!("xMidYMid slice"))
        );
    }

    #[test]
    fn rejects_bad_speed_and_direction() {
        assert!(matches!(
            PlayerConfig::from_json(r#"{"speed": 0}"#),
            Err(PlayerError::InvalidSpeed { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_json(r#"{"direction": 2}"#),
            Err(PlayerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn snapshot_filenames() {
        assert_eq!(Renderer::Svg.snapshot_filename(), "snapshot.svg");
        assert_eq!(Renderer::Canvas.snapshot_filename(), "snapshot.png");
    }
}
