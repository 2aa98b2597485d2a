use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info, warn};

use crate::error::EngineError;

use super::types::{EngineCmd, EngineEvent, EngineEventSink, SessionToken};

/// How often the thread wakes up to notice a drained sink.
const END_CHECK: Duration = Duration::from_millis(200);

/// The one live sink, owned by the token that asked for it.
struct Binding {
    token: SessionToken,
    sink: Sink,
    duration: Option<f64>,
    playing: bool,
}

fn open_source(path: &Path) -> Result<(Decoder<BufReader<File>>, Option<f64>), EngineError> {
    let construction = |reason: String| EngineError::Construction {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| construction(e.to_string()))?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| construction(e.to_string()))?;
    let duration = source.total_duration().map(|d| d.as_secs_f64());
    Ok((source, duration))
}

fn open_stream() -> Result<OutputStream, EngineError> {
    let mut stream = OutputStreamBuilder::open_default_stream()
        .map_err(|e| EngineError::Runtime(format!("no audio output device: {e}")))?;
    // rodio logs to stderr when the stream is dropped, which garbles the TUI.
    stream.log_on_drop(false);
    Ok(stream)
}

struct EngineThread {
    emit: EngineEventSink,
    stream: Option<OutputStream>,
    binding: Option<Binding>,
}

impl EngineThread {
    /// The binding, if `token` owns it.
    fn bound(&mut self, token: SessionToken) -> Option<&mut Binding> {
        match self.binding.as_mut() {
            Some(b) if b.token == token => Some(b),
            _ => {
                debug!(%token, "ignoring engine command for a stale token");
                None
            }
        }
    }

    fn drop_binding(&mut self) {
        if let Some(b) = self.binding.take() {
            b.sink.stop();
        }
    }

    fn load(&mut self, token: SessionToken, path: PathBuf) {
        self.drop_binding();

        let loaded = open_source(&path).and_then(|(source, duration)| {
            if self.stream.is_none() {
                self.stream = Some(open_stream()?);
            }
            let stream = self
                .stream
                .as_ref()
                .ok_or_else(|| EngineError::Runtime("audio output closed".into()))?;
            let sink = Sink::connect_new(stream.mixer());
            sink.append(source);
            sink.pause();
            Ok(Binding {
                token,
                sink,
                duration,
                playing: false,
            })
        });

        match loaded {
            Ok(binding) => {
                debug!(%token, path = %path.display(), duration = ?binding.duration, "track loaded");
                let duration = binding.duration;
                self.binding = Some(binding);
                (self.emit)(EngineEvent::Ready { token, duration });
            }
            Err(error) => {
                warn!(%token, %error, "failed to load track");
                (self.emit)(EngineEvent::Failed { token, error });
            }
        }
    }

    fn handle(&mut self, cmd: EngineCmd) -> bool {
        match cmd {
            EngineCmd::Load { token, path } => self.load(token, path),
            EngineCmd::Play { token } => {
                if let Some(b) = self.bound(token) {
                    b.sink.play();
                    b.playing = true;
                }
            }
            EngineCmd::Pause { token } => {
                if let Some(b) = self.bound(token) {
                    b.sink.pause();
                    b.playing = false;
                }
            }
            EngineCmd::Stop { token } => {
                if let Some(b) = self.bound(token) {
                    b.sink.pause();
                    b.playing = false;
                }
            }
            EngineCmd::Release { token } => {
                if self.bound(token).is_some() {
                    self.drop_binding();
                }
            }
            EngineCmd::QueryPosition { token } => {
                if let Some(b) = self.bound(token) {
                    let event = EngineEvent::Position {
                        token,
                        position: Some(b.sink.get_pos().as_secs_f64()),
                        duration: b.duration,
                    };
                    (self.emit)(event);
                }
            }
            EngineCmd::SeekTo { token, ms } => {
                if let Some(b) = self.bound(token) {
                    if let Err(e) = b.sink.try_seek(Duration::from_millis(ms)) {
                        let error = EngineError::SeekUnsupported(e.to_string());
                        (self.emit)(EngineEvent::SeekFailed { token, error });
                    }
                }
            }
            EngineCmd::Quit => {
                self.drop_binding();
                return false;
            }
        }
        true
    }

    /// Report a drained sink once.
    fn check_finished(&mut self) {
        if let Some(b) = self.binding.as_mut() {
            if b.playing && b.sink.empty() {
                b.playing = false;
                let token = b.token;
                debug!(%token, "track finished");
                (self.emit)(EngineEvent::Finished { token });
            }
        }
    }
}

impl EngineThread {
    fn new(emit: EngineEventSink) -> Self {
        Self {
            emit,
            stream: None,
            binding: None,
        }
    }

    /// Serve commands until told to quit or the sender goes away. The sink is
    /// checked for completion after every wakeup, not only on idle timeouts.
    fn run(mut self, rx: Receiver<EngineCmd>) {
        loop {
            match rx.recv_timeout(END_CHECK) {
                Ok(cmd) => {
                    if !self.handle(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.check_finished();
        }
        self.drop_binding();
        info!("audio thread stopped");
    }
}

pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    emit: EngineEventSink,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("encore-audio".into())
        .spawn(move || EngineThread::new(emit).run(rx))
}
