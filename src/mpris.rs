//! MPRIS (D-Bus) now-playing surface and remote control.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::library::Artwork;
use crate::player::{Command, NowPlaying, NowPlayingMetadata};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
const NOTIFY_POLL: Duration = Duration::from_millis(200);

/// Requests arriving over D-Bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

impl ControlCmd {
    /// The player command this maps to; `Quit` is handled by the runtime.
    pub fn into_command(self) -> Option<Command> {
        match self {
            ControlCmd::Quit => None,
            ControlCmd::Play => Some(Command::Play),
            ControlCmd::Pause => Some(Command::Pause),
            ControlCmd::PlayPause => Some(Command::PlayPause),
            ControlCmd::Stop => Some(Command::Stop),
            ControlCmd::Next => Some(Command::Next),
            ControlCmd::Prev => Some(Command::Previous),
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    active: bool,
    playing: bool,
    serial: u64,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
}

impl SharedState {
    fn status(&self) -> &'static str {
        match (self.active, self.playing) {
            (false, _) => "Stopped",
            (true, true) => "Playing",
            (true, false) => "Paused",
        }
    }

    fn set_metadata(&mut self, meta: &NowPlayingMetadata) {
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

        self.active = true;
        self.serial += 1;
        self.title = non_empty(&meta.title);
        self.artist = non_empty(&meta.artist).into_iter().collect();
        self.album = non_empty(&meta.album);
        self.url = Some(format!("file://{}", meta.path.display()));
        self.art_url = Artwork::from_uri(&meta.cover)
            .external_uri()
            .map(str::to_string);
        self.length_micros = (meta.length_secs > 0)
            .then(|| i64::try_from(meta.length_secs.saturating_mul(1_000_000)).unwrap_or(i64::MAX));
        self.track_id =
            OwnedObjectPath::try_from(format!("/org/encore/track/{}", self.serial)).ok();
    }

    fn clear(&mut self) {
        let serial = self.serial;
        *self = SharedState {
            serial,
            ..SharedState::default()
        };
    }
}

/// Handle the player uses to publish what it is doing.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    fn update(&self, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
        // A missing service only means nobody listens.
        let _ = self.notify.send(());
    }
}

impl NowPlaying for MprisHandle {
    fn update_metadata(&mut self, meta: &NowPlayingMetadata) {
        self.update(|s| s.set_metadata(meta));
    }

    fn update_is_playing(&mut self, playing: bool) {
        self.update(|s| s.playing = playing);
    }

    fn stopped(&mut self) {
        self.update(|s| {
            s.active = false;
            s.playing = false;
        });
    }

    fn clear(&mut self) {
        self.update(SharedState::clear);
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned(v: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(v).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state.lock().map_or("Stopped", |s| s.status())
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };
        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };

        put(
            "mpris:trackid",
            s.track_id
                .as_ref()
                .and_then(|p| owned(Value::from(p.clone().into_inner()))),
        );
        put("xesam:title", s.title.clone().and_then(|t| owned(Value::from(t))));
        if !s.artist.is_empty() {
            put("xesam:artist", owned(Value::from(s.artist.clone())));
        }
        put("xesam:album", s.album.clone().and_then(|a| owned(Value::from(a))));
        put("xesam:url", s.url.clone().and_then(|u| owned(Value::from(u))));
        put("mpris:artUrl", s.art_url.clone().and_then(|u| owned(Value::from(u))));
        put("mpris:length", s.length_micros.and_then(|l| owned(Value::from(l))));
        map
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    info!(bus = BUS_NAME, "MPRIS service registered");

    let iface_ref = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if !changed {
            continue;
        }

        let iface = iface_ref.get().await;
        let emitter = iface_ref.signal_emitter();
        if let Err(e) = iface.playback_status_changed(emitter).await {
            debug!(error = %e, "PlaybackStatus change signal failed");
        }
        if let Err(e) = iface.metadata_changed(emitter).await {
            debug!(error = %e, "Metadata change signal failed");
        }
    }
}

/// Start the D-Bus service on its own thread. Failing to reach the session
/// bus only disables the surface.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("encore-mpris".into())
        .spawn(move || {
            if let Err(e) = block_on(serve(tx, state_for_thread, notify_rx)) {
                warn!(error = %e, "MPRIS disabled");
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "cannot spawn MPRIS thread");
    }

    MprisHandle {
        state,
        notify: notify_tx,
    }
}
