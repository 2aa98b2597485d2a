use std::path::PathBuf;

use crate::engine::EngineEvent;
use crate::error::PlayerError;
use crate::library::TagData;

/// User intents, whatever surface they come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    PlayIndex(usize),
    /// Absolute seek to a percentage of the track.
    SeekPercent(u8),
    /// Relative scrub in seconds.
    SeekBy(i64),
    ToggleShuffle,
    CycleRepeat,
    /// Files or directories as typed by the user.
    AppendPaths(Vec<String>),
    Remove(usize),
    Move { from: usize, to: usize },
}

/// Everything the controller reacts to.
#[derive(Debug)]
pub enum Event {
    Command(Command),
    Engine(EngineEvent),
    /// A progress tick from the ticker with this generation.
    Tick { generation: u64 },
    Metadata {
        path: PathBuf,
        result: Result<TagData, PlayerError>,
    },
}

impl From<Command> for Event {
    fn from(c: Command) -> Self {
        Event::Command(c)
    }
}
