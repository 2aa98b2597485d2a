use crate::engine::SessionToken;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Waiting for the engine to construct the binding.
    Loading,
    Playing,
    Paused,
    /// The track ended; the completion policy is being applied.
    Completed,
    /// The engine failed. Nothing is retried until the user asks.
    Error,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Stopped",
            PlaybackState::Loading => "Loading",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Completed => "Completed",
            PlaybackState::Error => "Error",
        }
    }

    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

/// The live engine binding and what we know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    pub token: SessionToken,
    /// Last known position, whole seconds.
    pub position_secs: u64,
    /// Whole seconds; 0 until resolved.
    pub duration_secs: u64,
}

impl PlaybackSession {
    pub fn new(token: SessionToken, duration_secs: u64) -> Self {
        Self {
            token,
            position_secs: 0,
            duration_secs,
        }
    }
}
