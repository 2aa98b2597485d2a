//! Tag reading for playlist entries.
//!
//! Reads happen on a worker thread; results are handed back through a
//! callback so the controller can apply them as a discrete event.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use lofty::picture::{Picture, PictureType};
use lofty::prelude::*;
use tracing::{debug, warn};

use crate::error::PlayerError;

use super::model::{Artwork, Track};

/// Whatever the tags of one file could tell us. Missing values stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagData {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub art: Option<Artwork>,
    /// Whole seconds from the container's audio properties.
    pub duration: Option<u64>,
}

impl TagData {
    /// Copy known values onto `track`. A duration is only taken when the track
    /// has none yet. Returns whether anything changed.
    pub fn apply_to(&self, track: &mut Track) -> bool {
        let mut changed = false;
        let mut set = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                if slot != v {
                    *slot = v.to_string();
                    changed = true;
                }
            }
        };
        set(&mut track.title, &self.title);
        set(&mut track.artist, &self.artist);
        set(&mut track.album, &self.album);

        if let Some(art) = &self.art {
            if &track.art != art {
                track.art = art.clone();
                changed = true;
            }
        }
        if let Some(d) = self.duration.filter(|d| *d > 0) {
            if !track.has_duration() {
                track.duration = d;
                changed = true;
            }
        }
        changed
    }
}

/// Read tags and audio properties from `path`.
pub fn read_tags(path: &Path) -> Result<TagData, PlayerError> {
    let tagged = lofty::read_from_path(path).map_err(|e| PlayerError::MetadataRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut data = TagData {
        duration: Some(tagged.properties().duration().as_secs()).filter(|d| *d > 0),
        ..TagData::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        data.title = tag.title().map(|v| v.trim().to_string());
        data.artist = tag.artist().map(|v| v.trim().to_string());
        data.album = tag.album().map(|v| v.trim().to_string());
        data.art = pick_cover(tag.pictures()).map(|p| Artwork::Inline {
            mime: p
                .mime_type()
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "image/jpeg".to_string()),
            data: p.data().to_vec(),
        });
    }

    Ok(data)
}

fn pick_cover(pictures: &[Picture]) -> Option<&Picture> {
    pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
}

/// Something that can be asked to (eventually) read a file's tags.
pub trait MetadataSource {
    /// Queue a read; the outcome is delivered out of band.
    fn request(&self, path: &Path);
}

pub type MetadataCallback = Arc<dyn Fn(PathBuf, Result<TagData, PlayerError>) + Send + Sync>;

/// `lofty`-backed reader running on one worker thread.
pub struct LoftyMetadata {
    tx: Sender<PathBuf>,
}

impl LoftyMetadata {
    pub fn spawn(on_read: MetadataCallback) -> Self {
        let (tx, rx) = mpsc::channel::<PathBuf>();
        let spawned = thread::Builder::new()
            .name("encore-tags".to_string())
            .spawn(move || {
                while let Ok(path) = rx.recv() {
                    let result = read_tags(&path);
                    if let Err(e) = &result {
                        debug!(error = %e, "tag read failed");
                    }
                    on_read(path, result);
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "could not start tag reader; metadata stays path-derived");
        }
        Self { tx }
    }
}

impl MetadataSource for LoftyMetadata {
    fn request(&self, path: &Path) {
        // A dead worker only means tags stay unresolved.
        let _ = self.tx.send(path.to_path_buf());
    }
}
