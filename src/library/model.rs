use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::display::name_from_path;

/// Stored form of the placeholder artwork.
pub const PLACEHOLDER_ART: &str = "placeholder";

/// Cover art attached to a track.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Artwork {
    #[default]
    Placeholder,
    /// A reference the notification surface can load itself (e.g. `file://...`).
    Uri(String),
    /// Picture bytes extracted from the file's tags.
    Inline { mime: String, data: Vec<u8> },
}

impl Artwork {
    /// Render as a single string: the URI, a `data:` URI, or the placeholder marker.
    pub fn to_uri(&self) -> String {
        match self {
            Artwork::Placeholder => PLACEHOLDER_ART.to_string(),
            Artwork::Uri(uri) => uri.clone(),
            Artwork::Inline { mime, data } => {
                format!("data:{mime};base64,{}", STANDARD.encode(data))
            }
        }
    }

    /// Inverse of [`Artwork::to_uri`]. Undecodable `data:` URIs degrade to the placeholder.
    pub fn from_uri(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == PLACEHOLDER_ART {
            return Artwork::Placeholder;
        }
        let Some(rest) = raw.strip_prefix("data:") else {
            return Artwork::Uri(raw.to_string());
        };
        let Some((mime, payload)) = rest.split_once(";base64,") else {
            return Artwork::Placeholder;
        };
        match STANDARD.decode(payload) {
            Ok(data) => Artwork::Inline {
                mime: mime.to_string(),
                data,
            },
            Err(_) => Artwork::Placeholder,
        }
    }

    /// The URI to hand to an external surface, if it can load it.
    pub fn external_uri(&self) -> Option<&str> {
        match self {
            Artwork::Uri(uri) => Some(uri.as_str()),
            _ => None,
        }
    }
}

/// A playlist entry. Identity is the source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    /// File name derived from the path.
    pub name: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Whole seconds; 0 means not known yet.
    pub duration: u64,
    pub art: Artwork,
}

impl Track {
    /// A fresh entry with only path-derived fields filled in.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = name_from_path(&path);
        Self {
            title: name.clone(),
            name,
            path,
            artist: String::new(),
            album: String::new(),
            duration: 0,
            art: Artwork::Placeholder,
        }
    }

    pub fn is_at(&self, path: &Path) -> bool {
        self.path == path
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0
    }
}
