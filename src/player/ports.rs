use std::path::PathBuf;

use crate::library::{Track, display_title};

/// What the notification surface shows for the current track.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NowPlayingMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Artwork URI, a `data:` URI, or the placeholder marker.
    pub cover: String,
    pub length_secs: u64,
    pub path: PathBuf,
}

impl From<&Track> for NowPlayingMetadata {
    fn from(t: &Track) -> Self {
        Self {
            title: display_title(t).to_string(),
            artist: t.artist.clone(),
            album: t.album.clone(),
            cover: t.art.to_uri(),
            length_secs: t.duration,
            path: t.path.clone(),
        }
    }
}

/// An external "now playing" surface kept in sync with playback.
pub trait NowPlaying {
    fn update_metadata(&mut self, meta: &NowPlayingMetadata);
    fn update_is_playing(&mut self, playing: bool);
    /// Playback ended on its own or failed; the last track stays on show.
    fn stopped(&mut self);
    /// Nothing is playing any more.
    fn clear(&mut self);
}
