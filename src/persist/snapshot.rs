use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PlayerError;
use crate::library::{Artwork, PLACEHOLDER_ART, Track};

use super::store::KeyValueStore;

/// The single key the playlist lives under.
pub const PLAYLIST_KEY: &str = "playlist";

/// On-disk shape of one playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTrack {
    pub path: PathBuf,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub duration: u64,
    #[serde(default = "placeholder_art")]
    pub art: String,
}

fn placeholder_art() -> String {
    PLACEHOLDER_ART.to_string()
}

impl From<&Track> for StoredTrack {
    fn from(t: &Track) -> Self {
        Self {
            path: t.path.clone(),
            name: t.name.clone(),
            title: t.title.clone(),
            artist: t.artist.clone(),
            album: t.album.clone(),
            duration: t.duration,
            art: t.art.to_uri(),
        }
    }
}

impl From<StoredTrack> for Track {
    fn from(s: StoredTrack) -> Self {
        let mut track = Track::from_path(s.path);
        if !s.name.is_empty() {
            track.name = s.name;
        }
        track.title = if s.title.is_empty() {
            track.name.clone()
        } else {
            s.title
        };
        track.artist = s.artist;
        track.album = s.album;
        track.duration = s.duration;
        track.art = Artwork::from_uri(&s.art);
        track
    }
}

/// Write the full ordered list. Failures are logged, never propagated.
pub fn save_playlist(store: &mut dyn KeyValueStore, tracks: &[Track]) {
    let stored: Vec<StoredTrack> = tracks.iter().map(StoredTrack::from).collect();
    let json = match serde_json::to_string(&stored) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "cannot serialize playlist");
            return;
        }
    };
    match store.set(PLAYLIST_KEY, &json) {
        Ok(()) => debug!(tracks = stored.len(), "playlist saved"),
        Err(e) => warn!(error = %e, "cannot save playlist"),
    }
}

fn read_playlist(store: &dyn KeyValueStore) -> Result<Vec<Track>, PlayerError> {
    let Some(json) = store
        .get(PLAYLIST_KEY)
        .map_err(|e| PlayerError::PersistenceRead(e.to_string()))?
    else {
        return Ok(Vec::new());
    };
    let stored: Vec<StoredTrack> =
        serde_json::from_str(&json).map_err(|e| PlayerError::PersistenceRead(e.to_string()))?;
    Ok(stored.into_iter().map(Track::from).collect())
}

/// Restore the saved list. Missing or malformed data yields an empty list.
pub fn load_playlist(store: &dyn KeyValueStore) -> Vec<Track> {
    match read_playlist(store) {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!(error = %e, "starting with an empty playlist");
            Vec::new()
        }
    }
}
