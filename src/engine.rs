//! The playback engine seam and its `rodio` implementation.

mod player;
mod thread;
mod types;

use std::path::Path;

use crate::error::EngineError;

pub use player::AudioEngine;
pub use types::{EngineCmd, EngineEvent, EngineEventSink, SessionToken};

/// Commands the controller issues to whatever plays audio.
///
/// Calls only fail when the request cannot be delivered; the outcome of a
/// delivered request comes back as an [`EngineEvent`].
pub trait PlaybackEngine {
    fn load(&mut self, token: SessionToken, path: &Path) -> Result<(), EngineError>;
    fn play(&mut self, token: SessionToken) -> Result<(), EngineError>;
    fn pause(&mut self, token: SessionToken) -> Result<(), EngineError>;
    fn stop(&mut self, token: SessionToken) -> Result<(), EngineError>;
    fn release(&mut self, token: SessionToken) -> Result<(), EngineError>;
    fn query_position(&mut self, token: SessionToken) -> Result<(), EngineError>;
    fn seek_to(&mut self, token: SessionToken, ms: u64) -> Result<(), EngineError>;
    fn shutdown(&mut self);
}
