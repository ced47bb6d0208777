//! Read-only view model for the control surface.

use serde::{Deserialize, Serialize};

use crate::color::Background;
use crate::config::{Button, Direction, Theme};
use crate::state::PlaybackState;

/// Everything the control surface needs to render, captured at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub state: PlaybackState,
    pub seeker: u32,
    pub total_frames: u32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub speed: f64,
    pub direction: Direction,
    pub background: Background,
    pub buttons: Vec<Button>,
    pub theme: Theme,
    pub controls: bool,
    pub has_instance: bool,
}

impl PlayerView {
    /// Seek-bar position in percent.
    pub fn progress_percent(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (self.seeker as f64 / self.total_frames as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Frame a seek-bar position in percent maps to.
    pub fn frame_for_progress(&self, percent: f64) -> u32 {
        if !percent.is_finite() {
            return 0;
        }
        let ratio = percent.clamp(0.0, 100.0) / 100.0;
        (ratio * self.total_frames as f64).floor() as u32
    }

    #[inline]
    pub fn shows(&self, button: Button) -> bool {
        self.controls && self.buttons.contains(&button)
    }
}
