use std::path::Path;

use crate::library::Track;

/// What `Playlist::remove` did to the current entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Index was out of range; nothing changed.
    Ignored,
    /// Some other entry was removed.
    Other,
    /// The current entry itself was removed.
    Current,
}

/// Ordered track list plus the current position.
///
/// Invariant: `current` is `Some(i)` with `i < len()` whenever the list is
/// non-empty, and `None` when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from restored tracks; the first one becomes current.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let current = if tracks.is_empty() { None } else { Some(0) };
        Self { tracks, current }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Point at `index`. Returns false (and changes nothing) when out of range.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Add at the end. Returns the new entry's index.
    pub fn append(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        if self.current.is_none() {
            self.current = Some(0);
        }
        self.tracks.len() - 1
    }

    /// Remove one entry and keep `current` valid.
    pub fn remove(&mut self, index: usize) -> Removal {
        if index >= self.tracks.len() {
            return Removal::Ignored;
        }
        self.tracks.remove(index);

        let outcome = if self.current == Some(index) {
            Removal::Current
        } else {
            Removal::Other
        };

        self.current = match self.current {
            _ if self.tracks.is_empty() => None,
            Some(cur) if cur > index => Some(cur - 1),
            Some(cur) => Some(cur.min(self.tracks.len() - 1)),
            None => Some(0),
        };
        outcome
    }

    /// Relocate one entry, keeping every other entry's relative order.
    ///
    /// `current` follows the track it pointed at. `to` past the end means the
    /// last slot. Returns false when `from` is out of range.
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        let len = self.tracks.len();
        if from >= len {
            return false;
        }
        let to = to.min(len - 1);
        if from == to {
            return true;
        }

        let item = self.tracks.remove(from);
        self.tracks.insert(to, item);

        if let Some(cur) = self.current {
            self.current = Some(if cur == from {
                to
            } else if from < cur && to >= cur {
                cur - 1
            } else if from > cur && to <= cur {
                cur + 1
            } else {
                cur
            });
        }
        true
    }

    /// Indices of every entry whose path is `path`.
    pub fn positions_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = usize> + 'a {
        self.tracks
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.is_at(path))
            .map(|(i, _)| i)
    }
}
