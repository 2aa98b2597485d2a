use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::config;
use crate::engine::AudioEngine;
use crate::library::LoftyMetadata;
use crate::mpris::MprisHandle;
use crate::persist::{FileStore, KeyValueStore, MemoryStore};
use crate::player::{Collaborators, Controller, Event};
use crate::progress::ProgressMonitor;
use crate::selection::SelectionState;

fn open_store(settings: &config::Settings) -> Box<dyn KeyValueStore> {
    match settings.store_path() {
        Some(path) => {
            info!(path = %path.display(), "playlist store");
            Box::new(FileStore::new(path))
        }
        None => {
            warn!("no data directory; the playlist will not be saved");
            Box::new(MemoryStore::new())
        }
    }
}

/// Wire the controller to the audio thread, the tag reader, the ticker and
/// the store. Every worker reports back through `events`.
pub fn build_player(
    settings: &config::Settings,
    events: Sender<Event>,
    mpris: MprisHandle,
) -> std::io::Result<Controller> {
    let engine_tx = events.clone();
    let engine = AudioEngine::spawn(Box::new(move |ev| {
        let _ = engine_tx.send(Event::Engine(ev));
    }))?;

    let tick_tx = events.clone();
    let monitor = ProgressMonitor::new(
        Duration::from_millis(settings.progress.poll_interval_ms),
        Arc::new(move |generation| {
            let _ = tick_tx.send(Event::Tick { generation });
        }),
    );

    let metadata = LoftyMetadata::spawn(Arc::new(move |path, result| {
        let _ = events.send(Event::Metadata { path, result });
    }));

    Ok(Controller::new(
        Collaborators {
            engine: Box::new(engine),
            monitor,
            store: open_store(settings),
            metadata: Box::new(metadata),
            now_playing: Box::new(mpris),
        },
        SelectionState::from(&settings.playback),
        settings.library.clone(),
        StdRng::from_os_rng(),
    ))
}
