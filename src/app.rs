//! Application module: the view state of the TUI.
//!
//! Playback itself lives in `player`; `App` only tracks the cursor, the
//! prompt and which popups are open.

mod model;

pub use model::*;
