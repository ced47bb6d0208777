//! Pointer interaction on the rendering container.

use serde::{Deserialize, Serialize};

/// Pointer input forwarded by the host when `hover` or `click` is enabled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerInput {
    Enter,
    Leave,
    Click,
}

/// Command sequence a pointer input maps to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PointerAction {
    /// `stop()` first when `restart`, then `play()`
    Start { restart: bool },
    Stop,
    Nothing,
}

/// Map an input to an action given the widget flags and current state.
pub(crate) fn pointer_action(
    input: PointerInput,
    hover: bool,
    click: bool,
    keep_last_frame: bool,
    playing: bool,
) -> PointerAction {
    let start = PointerAction::Start {
        restart: keep_last_frame,
    };
    match input {
        PointerInput::Enter if hover && !playing => start,
        PointerInput::Leave if hover && playing => PointerAction::Stop,
        PointerInput::Click if click => {
            if playing {
                PointerAction::Stop
            } else {
                start
            }
        }
        _ => PointerAction::Nothing,
    }
}
