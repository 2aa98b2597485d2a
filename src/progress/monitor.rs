use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// Receives the generation of the ticker that fired.
pub type TickSink = Arc<dyn Fn(u64) + Send + Sync>;

struct Ticker {
    stop: Sender<()>,
    join: JoinHandle<()>,
}

/// A single cancellable periodic ticker.
///
/// Every `start` bumps the generation, so a tick that was already on its way
/// when the ticker got replaced can be recognized and dropped by the receiver.
pub struct ProgressMonitor {
    interval: Duration,
    emit: TickSink,
    generation: u64,
    ticker: Option<Ticker>,
}

impl ProgressMonitor {
    pub fn new(interval: Duration, emit: TickSink) -> Self {
        Self {
            interval,
            emit,
            generation: 0,
            ticker: None,
        }
    }

    /// Replace any running ticker with a fresh one.
    pub fn start(&mut self) {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let interval = self.interval;
        let emit = Arc::clone(&self.emit);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("encore-progress".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => emit(generation),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(join) => {
                debug!(generation, "progress ticker started");
                self.ticker = Some(Ticker {
                    stop: stop_tx,
                    join,
                });
            }
            Err(e) => warn!(error = %e, "cannot spawn progress ticker"),
        }
    }

    pub fn stop(&mut self) {
        if let Some(Ticker { stop, join }) = self.ticker.take() {
            drop(stop);
            let _ = join.join();
            debug!(generation = self.generation, "progress ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick from `generation` belongs to the running ticker.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_running() && generation == self.generation
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
