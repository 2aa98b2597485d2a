//! Messages exchanged with the audio thread.

use std::fmt;
use std::path::PathBuf;

use crate::error::EngineError;

/// Identifies one engine binding. Strictly increasing across the process;
/// anything tagged with an older token is stale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionToken(pub u64);

impl SessionToken {
    pub fn next(self) -> Self {
        SessionToken(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub enum EngineCmd {
    /// Decode `path` into a fresh, paused binding owned by `token`.
    Load { token: SessionToken, path: PathBuf },
    Play { token: SessionToken },
    Pause { token: SessionToken },
    Stop { token: SessionToken },
    /// Drop the binding.
    Release { token: SessionToken },
    /// Report the current position with an [`EngineEvent::Position`].
    QueryPosition { token: SessionToken },
    /// Absolute seek in milliseconds.
    SeekTo { token: SessionToken, ms: u64 },
    Quit,
}

/// Everything the audio thread reports back. Each event carries the token of
/// the binding it concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The binding is constructed and paused at the start.
    Ready {
        token: SessionToken,
        /// Seconds, when the decoder knows it.
        duration: Option<f64>,
    },
    Position {
        token: SessionToken,
        position: Option<f64>,
        duration: Option<f64>,
    },
    /// The source ran out while playing.
    Finished { token: SessionToken },
    Failed {
        token: SessionToken,
        error: EngineError,
    },
    SeekFailed {
        token: SessionToken,
        error: EngineError,
    },
}

impl EngineEvent {
    pub fn token(&self) -> SessionToken {
        match self {
            EngineEvent::Ready { token, .. }
            | EngineEvent::Position { token, .. }
            | EngineEvent::Finished { token }
            | EngineEvent::Failed { token, .. }
            | EngineEvent::SeekFailed { token, .. } => *token,
        }
    }
}

/// Callback the audio thread reports through.
pub type EngineEventSink = Box<dyn Fn(EngineEvent) + Send>;
