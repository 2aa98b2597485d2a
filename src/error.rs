//! Error taxonomy shared by the controller and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by the playback engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not open or decode the track.
    #[error("cannot play {path:?}: {reason}")]
    Construction { path: PathBuf, reason: String },

    /// The engine failed while a track was loaded.
    #[error("playback failed: {0}")]
    Runtime(String),

    /// The loaded source does not support seeking.
    #[error("seek not supported: {0}")]
    SeekUnsupported(String),

    /// The engine thread is gone.
    #[error("audio engine is not running")]
    Disconnected,
}

/// Errors surfaced by the playback controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("track duration is not known yet")]
    DurationUnknown,

    #[error("cannot read tags from {path:?}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    #[error("saved playlist is unreadable: {0}")]
    PersistenceRead(String),

    #[error("permission denied: {0:?}")]
    PermissionDenied(PathBuf),

    #[error("no such file or directory: {0:?}")]
    PathNotFound(PathBuf),
}

impl PlayerError {
    /// Whether the error comes from the engine (and therefore moved the
    /// machine into the error state).
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            PlayerError::Engine(EngineError::Construction { .. })
                | PlayerError::Engine(EngineError::Runtime(_))
                | PlayerError::Engine(EngineError::Disconnected)
        )
    }
}
