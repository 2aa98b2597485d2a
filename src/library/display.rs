use std::path::Path;

use super::model::Track;

/// Last path component, or the whole path when there is none.
pub fn name_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Title shown in lists and sent to the notification surface.
pub fn display_title(track: &Track) -> &str {
    if track.title.trim().is_empty() {
        &track.name
    } else {
        &track.title
    }
}

/// Secondary line: artist, else album, else nothing.
pub fn display_subtitle(track: &Track) -> &str {
    if !track.artist.trim().is_empty() {
        &track.artist
    } else {
        track.album.trim()
    }
}

/// "Artist - Title" when an artist is known, else the title alone.
pub fn display_line(track: &Track) -> String {
    let title = display_title(track);
    match track.artist.trim() {
        "" => title.to_string(),
        artist => format!("{artist} - {title}"),
    }
}

/// Format whole seconds as `M:SS`.
pub fn format_time(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

