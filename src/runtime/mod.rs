use std::env;
use std::io;
use std::sync::mpsc::{self, Receiver};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::config::Settings;
use crate::mpris::ControlCmd;
use crate::player::{Controller, Event};

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();
    let log_path = settings.log_path();
    logging::init(&settings.logging, log_path.as_deref());
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "encore starting");

    // Files and directories on the command line are appended to the playlist.
    let inputs: Vec<String> = env::args().skip(1).collect();

    let (event_tx, event_rx) = mpsc::channel::<Event>();
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    let mut player = startup::build_player(&settings, event_tx, mpris)?;
    if !inputs.is_empty() {
        player.append_paths(&inputs);
    }
    let mut app = App::new(settings.ui.follow_playback);

    run_then_shutdown(
        &mut player,
        |player| terminal_session(&settings, &mut app, player, &event_rx, &control_rx),
        Controller::shutdown,
    )
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Run `session`, then `shutdown` regardless of how the session ended.
fn run_then_shutdown<P, T>(
    player: &mut P,
    session: impl FnOnce(&mut P) -> T,
    shutdown: impl FnOnce(&mut P),
) -> T {
    let result = session(player);
    shutdown(player);
    result
}

fn terminal_session(
    settings: &Settings,
    app: &mut App,
    player: &mut Controller,
    event_rx: &Receiver<Event>,
    control_rx: &Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let setup = execute!(stdout, EnterAlternateScreen)
        .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)));
    let mut terminal = match setup {
        Ok(t) => t,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
    };

    let run_result = event_loop::run(&mut terminal, settings, app, player, event_rx, control_rx);
    let restored = restore_terminal(&mut terminal);
    run_result?;
    restored?;
    Ok(())
}

/// Every step is attempted; the first failure is reported.
fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let cursor = terminal.show_cursor();
    raw.and(screen).and(cursor)
}
