//! The ordered track collection and its current-position bookkeeping.

mod model;

pub use model::{Playlist, Removal};
