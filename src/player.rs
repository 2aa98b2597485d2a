//! The playback controller: playlist ownership, the playback state machine
//! and the single event dispatch point.

mod controller;
mod events;
mod ports;
mod state;

pub use controller::{Collaborators, Controller};
pub use events::{Command, Event};
pub use ports::{NowPlaying, NowPlayingMetadata};
pub use state::{PlaybackSession, PlaybackState};

#[cfg(test)]
mod tests;
