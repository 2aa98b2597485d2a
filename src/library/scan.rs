use std::env;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::PlayerError;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Turn user input into an absolute, symlink-free path (`~/` is expanded).
pub fn resolve_native_path(input: &str) -> Result<PathBuf, PlayerError> {
    let input = input.trim();
    let expanded = match input.strip_prefix("~/") {
        Some(rest) => env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    };

    expanded.canonicalize().map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => PlayerError::PermissionDenied(expanded.clone()),
        _ => PlayerError::PathNotFound(expanded.clone()),
    })
}

/// Audio files below `dir`, sorted by path.
pub fn scan_dir(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && (settings.include_hidden || !is_hidden(path))
                && is_audio_file(path, settings)
        })
        .collect();

    files.sort();
    files
}

/// Resolve every input; directories expand to the audio files they contain.
///
/// Inputs that cannot be resolved are logged and skipped.
pub fn expand_inputs<S: AsRef<str>>(inputs: &[S], settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for input in inputs {
        match resolve_native_path(input.as_ref()) {
            Ok(path) if path.is_dir() => out.extend(scan_dir(&path, settings)),
            Ok(path) => out.push(path),
            Err(e) => warn!(input = input.as_ref(), error = %e, "skipping input"),
        }
    }
    out
}
