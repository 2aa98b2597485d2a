use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config;
use crate::mpris::ControlCmd;
use crate::player::{Command, Controller, Event};
use crate::ui;

/// What a keystroke asks of the runtime.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
    Player(Command),
}

/// Main terminal event loop: applies worker events and remote controls,
/// draws, and handles input. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Controller,
    events: &Receiver<Event>,
    control_rx: &Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(ev) = events.try_recv() {
            player.handle(ev);
        }

        while let Ok(cmd) = control_rx.try_recv() {
            match cmd.into_command() {
                Some(cmd) => {
                    app.follow_playback_on();
                    player.handle(cmd.into());
                }
                None => return Ok(()),
            }
        }

        let len = player.playlist().len();
        app.sync_with_playback(player.playlist().current(), len);
        terminal.draw(|f| ui::draw(f, app, player, &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key_event(key, app, len, settings.controls.scrub_seconds) {
                    KeyOutcome::Quit => return Ok(()),
                    KeyOutcome::Player(cmd) => player.handle(Event::Command(cmd)),
                    KeyOutcome::Continue => {}
                }
            }
        }
    }
}

fn handle_prompt_key(key: KeyEvent, app: &mut App) -> KeyOutcome {
    match key.code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Backspace => app.pop_input_char(),
        KeyCode::Enter => {
            if let Some(input) = app.submit_input() {
                return KeyOutcome::Player(Command::AppendPaths(vec![input]));
            }
        }
        KeyCode::Char(c) if !c.is_control() => app.push_input_char(c),
        _ => {}
    }
    KeyOutcome::Continue
}

/// Translate one key press in the context of a playlist of `len` entries.
pub fn handle_key_event(key: KeyEvent, app: &mut App, len: usize, scrub_seconds: u64) -> KeyOutcome {
    if app.is_prompting() {
        return handle_prompt_key(key, app);
    }

    if key.code == KeyCode::Char('g') && !app.pending_gg {
        app.pending_gg = true;
        return KeyOutcome::Continue;
    }
    let was_pending_gg = std::mem::take(&mut app.pending_gg);
    let scrub = i64::try_from(scrub_seconds).unwrap_or(i64::MAX);

    let cmd = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return KeyOutcome::Quit;
        }
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Char('g') if was_pending_gg => {
            app.follow_playback_off();
            app.top();
            return KeyOutcome::Continue;
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.bottom(len);
            return KeyOutcome::Continue;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next(len);
            return KeyOutcome::Continue;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev(len);
            return KeyOutcome::Continue;
        }
        KeyCode::Enter if len > 0 => {
            app.follow_playback_on();
            Command::PlayIndex(app.selected.min(len - 1))
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => Command::PlayPause,
        KeyCode::Char('l') => {
            app.follow_playback_on();
            Command::Next
        }
        KeyCode::Char('h') => {
            app.follow_playback_on();
            Command::Previous
        }
        KeyCode::Char('L') => Command::SeekBy(scrub),
        KeyCode::Char('H') => Command::SeekBy(-scrub),
        KeyCode::Char(d @ '0'..='9') => {
            let tenth = d.to_digit(10).unwrap_or(0) as u8;
            Command::SeekPercent(tenth * 10)
        }
        KeyCode::Char('S') => Command::Stop,
        KeyCode::Char('s') => Command::ToggleShuffle,
        KeyCode::Char('r') => Command::CycleRepeat,
        KeyCode::Char('a') => {
            app.begin_add_path();
            return KeyOutcome::Continue;
        }
        KeyCode::Char('d') if len > 0 => Command::Remove(app.selected.min(len - 1)),
        KeyCode::Char('J') if app.selected + 1 < len => {
            let from = app.selected;
            app.follow_playback_off();
            app.selected = from + 1;
            Command::Move { from, to: from + 1 }
        }
        KeyCode::Char('K') if app.selected > 0 && app.selected < len => {
            let from = app.selected;
            app.follow_playback_off();
            app.selected = from - 1;
            Command::Move { from, to: from - 1 }
        }
        KeyCode::Char('i') => {
            app.toggle_metadata_window();
            return KeyOutcome::Continue;
        }
        _ => return KeyOutcome::Continue,
    };
    KeyOutcome::Player(cmd)
}
