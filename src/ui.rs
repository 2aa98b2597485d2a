//! Frame rendering: header, status, progress gauge, playlist, popups and key help.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, InputMode};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{Track, display_line, display_subtitle, display_title, format_time};
use crate::player::{Controller, PlaybackState};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("0-9", "seek 0-90%");
    map.insert("S", "stop");
    map.insert("s", "shuffle");
    map.insert("r", "repeat");
    map.insert("a", "add");
    map.insert("d", "remove");
    map.insert("J/K", "move down/up");
    map.insert("i", "metadata");
    map.insert("q", "quit");
    map
});

const PAD_LEFT: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "0-9", "S", "gg/G", "s", "r", "a", "d", "J/K",
        "i", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{scrub_seconds}s"))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(elapsed: u64, total: u64, ui: &UiSettings) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_time(elapsed)),
            TimeField::Total if total > 0 => Some(format_time(total)),
            TimeField::Remaining if total > 0 => {
                Some(format!("-{}", format_time(total.saturating_sub(elapsed))))
            }
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn status_text(player: &Controller, app: &App, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    let state = player.state();
    parts.push(format!(" {}", state.label().to_uppercase()));

    if let (Some(track), true) = (
        player.current_track(),
        !matches!(state, PlaybackState::Idle | PlaybackState::Error),
    ) {
        let progress = player.progress();
        match now_playing_time_text(progress.elapsed_secs, player.current_duration(), ui) {
            Some(time) => parts.push(format!("Song: {} [{time}]", display_line(track))),
            None => parts.push(format!("Song: {}", display_line(track))),
        }
    }

    let selection = player.selection();
    parts.push(format!(
        "Shuffle: {}",
        if selection.shuffle { "ON" } else { "OFF" }
    ));
    parts.push(format!("Repeat: {}", selection.repeat.label()));
    parts.push(
        if app.follow_playback {
            "Cursor: Follow"
        } else {
            "Cursor: Free-roam"
        }
        .to_string(),
    );

    if let Some(err) = player.last_error() {
        let tag = if err.is_engine_failure() { "Error" } else { "Note" };
        parts.push(format!("{tag}: {err}"));
    }

    parts.join(" • ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn metadata_text(track: Option<&Track>) -> String {
    let Some(track) = track else {
        return "No track selected".to_string();
    };
    let or_dash = |s: &str| {
        if s.trim().is_empty() {
            "-".to_string()
        } else {
            s.to_string()
        }
    };
    let duration = if track.has_duration() {
        format!("{} ({}s)", format_time(track.duration), track.duration)
    } else {
        "-".to_string()
    };
    format!(
        "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nPath: {}",
        or_dash(&track.title),
        or_dash(&track.artist),
        or_dash(&track.album),
        duration,
        track.path.display()
    )
}

/// Visible window `[start, end)` around `selected`, and the selection's offset in it.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    let selected = selected.min(total.saturating_sub(1));
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    player: &Controller,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(player, app, ui_settings))
        .block(Block::bordered().padding(PAD_LEFT).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let progress = player.progress();
    let gauge = Gauge::default()
        .block(Block::bordered().title(" progress "))
        .gauge_style(Style::default().bold())
        .percent(u16::from(progress.percent.min(100)))
        .label(format!("{}%", progress.percent));
    frame.render_widget(gauge, chunks[2]);

    // Playlist, windowed around the cursor.
    {
        let playlist = player.playlist();
        let current = playlist.current();
        let playing = player.session().is_some();
        let total = playlist.len();
        let (start, end, selected_in_view) =
            visible_window(total, chunks[3].height.saturating_sub(2) as usize, app.selected);

        let items: Vec<ListItem> = playlist.tracks()[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let marker = if playing && current == Some(start + offset) {
                    "♪ "
                } else {
                    "  "
                };
                let mut spans = vec![Span::raw(marker), Span::raw(display_title(track).to_string())];
                let subtitle = display_subtitle(track);
                if !subtitle.is_empty() {
                    spans.push(Span::raw("  "));
                    spans.push(Span::raw(subtitle.to_string()).dim());
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" playlist ({total}) ")),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(selected_in_view));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 7, chunks[3]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(player.playlist().get(app.selected)))
            .block(
                Block::default()
                    .padding(PAD_LEFT)
                    .borders(Borders::ALL)
                    .title(" metadata (i closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    if let InputMode::AddPath(buf) = &app.input {
        let popup_area = centered_rect_sized(72, 3, chunks[3]);
        frame.render_widget(Clear, popup_area);
        let prompt = Paragraph::new(format!("{buf}_")).block(
            Block::default()
                .padding(PAD_LEFT)
                .borders(Borders::ALL)
                .title(" add file or directory (enter adds, esc cancels) "),
        );
        frame.render_widget(prompt, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(PAD_LEFT),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_text_lists_scrub_seconds_and_every_key() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        for key in CONTROLS_MAP.keys() {
            assert!(text.contains(&format!("[{key}]")), "missing {key}");
        }
    }

    #[test]
    fn time_text_skips_unknown_totals() {
        let ui = UiSettings {
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
            ..UiSettings::default()
        };
        assert_eq!(
            now_playing_time_text(65, 200, &ui).as_deref(),
            Some("1:05 / 3:20 / -2:15")
        );
        assert_eq!(now_playing_time_text(65, 0, &ui).as_deref(), Some("1:05"));

        let none = UiSettings {
            now_playing_time_fields: Vec::new(),
            ..UiSettings::default()
        };
        assert_eq!(now_playing_time_text(65, 200, &none), None);
    }

    #[test]
    fn window_keeps_selection_centered_and_in_bounds() {
        assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
        assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
        assert_eq!(visible_window(100, 10, 99), (90, 100, 9));
        assert_eq!(visible_window(0, 10, 0), (0, 0, 0));
    }

    #[test]
    fn metadata_text_uses_dashes_for_missing_fields() {
        let track = Track::from_path("/m/a.mp3");
        let text = metadata_text(Some(&track));
        assert!(text.contains("Artist: -"));
        assert!(text.contains("Duration: -"));
        assert_eq!(metadata_text(None), "No track selected");
    }
}
