use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use tracing::debug;

use crate::error::EngineError;

use super::PlaybackEngine;
use super::thread::spawn_engine_thread;
use super::types::{EngineCmd, EngineEventSink, SessionToken};

/// Handle to the audio thread. Commands are fire-and-forget; results come
/// back through the event sink given to [`AudioEngine::spawn`].
pub struct AudioEngine {
    tx: Sender<EngineCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioEngine {
    pub fn spawn(emit: EngineEventSink) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let handle = spawn_engine_thread(rx, emit)?;
        Ok(Self {
            tx,
            join: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, cmd: EngineCmd) -> Result<(), EngineError> {
        self.tx.send(cmd).map_err(|_| EngineError::Disconnected)
    }
}

impl PlaybackEngine for AudioEngine {
    fn load(&mut self, token: SessionToken, path: &Path) -> Result<(), EngineError> {
        self.send(EngineCmd::Load {
            token,
            path: path.to_path_buf(),
        })
    }

    fn play(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.send(EngineCmd::Play { token })
    }

    fn pause(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.send(EngineCmd::Pause { token })
    }

    fn stop(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.send(EngineCmd::Stop { token })
    }

    fn release(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.send(EngineCmd::Release { token })
    }

    fn query_position(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.send(EngineCmd::QueryPosition { token })
    }

    fn seek_to(&mut self, token: SessionToken, ms: u64) -> Result<(), EngineError> {
        self.send(EngineCmd::SeekTo { token, ms })
    }

    fn shutdown(&mut self) {
        let _ = self.send(EngineCmd::Quit);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
                debug!("audio engine joined");
            }
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
