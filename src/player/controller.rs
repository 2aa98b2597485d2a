use std::path::Path;

use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::config::LibrarySettings;
use crate::engine::{EngineEvent, PlaybackEngine, SessionToken};
use crate::error::{EngineError, PlayerError};
use crate::library::{MetadataSource, TagData, Track, expand_inputs};
use crate::persist::{KeyValueStore, load_playlist, save_playlist};
use crate::playlist::{Playlist, Removal};
use crate::progress::{
    Progress, ProgressMonitor, derive_progress, scrub_target_ms, seek_target_ms,
};
use crate::selection::{Direction, SelectionState, select_after_completion, select_next};

use super::events::{Command, Event};
use super::ports::{NowPlaying, NowPlayingMetadata};
use super::state::{PlaybackSession, PlaybackState};

/// The controller's outside world.
pub struct Collaborators {
    pub engine: Box<dyn PlaybackEngine>,
    pub monitor: ProgressMonitor,
    pub store: Box<dyn KeyValueStore>,
    pub metadata: Box<dyn MetadataSource>,
    pub now_playing: Box<dyn NowPlaying>,
}

/// Owns the playlist and the one playback session, and applies every event
/// to them on the caller's thread.
pub struct Controller {
    playlist: Playlist,
    selection: SelectionState,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    last_token: SessionToken,
    progress: Progress,
    last_error: Option<PlayerError>,
    library: LibrarySettings,
    rng: StdRng,
    engine: Box<dyn PlaybackEngine>,
    monitor: ProgressMonitor,
    store: Box<dyn KeyValueStore>,
    metadata: Box<dyn MetadataSource>,
    now_playing: Box<dyn NowPlaying>,
}

impl Controller {
    /// Restore the saved playlist and queue tag reads for it. Nothing plays
    /// until asked.
    pub fn new(
        parts: Collaborators,
        selection: SelectionState,
        library: LibrarySettings,
        rng: StdRng,
    ) -> Self {
        let Collaborators {
            engine,
            monitor,
            store,
            metadata,
            now_playing,
        } = parts;

        let playlist = Playlist::from_tracks(load_playlist(store.as_ref()));
        info!(tracks = playlist.len(), "playlist restored");
        for track in playlist.tracks() {
            metadata.request(&track.path);
        }

        Self {
            playlist,
            selection,
            state: PlaybackState::Idle,
            session: None,
            last_token: SessionToken::default(),
            progress: Progress::default(),
            last_error: None,
            library,
            rng,
            engine,
            monitor,
            store,
            metadata,
            now_playing,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.playlist.current_track()
    }

    /// Duration of the current track as far as anyone knows, in seconds.
    pub fn current_duration(&self) -> u64 {
        self.session
            .as_ref()
            .map(|s| s.duration_secs)
            .filter(|d| *d > 0)
            .or_else(|| self.current_track().map(|t| t.duration))
            .unwrap_or(0)
    }

    /// The single dispatch point for everything that happens to the player.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Command(cmd) => self.command(cmd),
            Event::Engine(ev) => {
                if !self.is_live(ev.token()) {
                    debug!(token = %ev.token(), ?ev, "discarding stale engine event");
                    return;
                }
                self.engine_event(ev);
            }
            Event::Tick { generation } => {
                if !self.monitor.is_current(generation) {
                    let live = self.monitor.generation();
                    debug!(generation, live, "discarding stale tick");
                    return;
                }
                self.tick();
            }
            Event::Metadata { path, result } => match result {
                Ok(tags) => self.apply_tags(&path, &tags),
                Err(e) => debug!(path = %path.display(), error = %e, "no tags"),
            },
        }
    }

    fn command(&mut self, cmd: Command) {
        debug!(?cmd, state = ?self.state, "command");
        let outcome = match cmd {
            Command::Play => {
                self.play();
                Ok(())
            }
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::PlayPause => {
                self.play_pause();
                Ok(())
            }
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Next => {
                self.next();
                Ok(())
            }
            Command::Previous => {
                self.previous();
                Ok(())
            }
            Command::PlayIndex(i) => {
                self.play_index(i);
                Ok(())
            }
            Command::SeekPercent(p) => self.seek_percent(p),
            Command::SeekBy(delta) => self.seek_by(delta),
            Command::ToggleShuffle => {
                self.selection.toggle_shuffle();
                info!(shuffle = self.selection.shuffle, "shuffle toggled");
                Ok(())
            }
            Command::CycleRepeat => {
                self.selection.cycle_repeat();
                info!(repeat = self.selection.repeat.label(), "repeat mode changed");
                Ok(())
            }
            Command::AppendPaths(inputs) => {
                self.append_paths(&inputs);
                Ok(())
            }
            Command::Remove(i) => {
                self.remove(i);
                Ok(())
            }
            Command::Move { from, to } => {
                self.move_track(from, to);
                Ok(())
            }
        };
        if let Err(e) = outcome {
            warn!(error = %e, "command failed");
            self.last_error = Some(e);
        }
    }

    fn is_live(&self, token: SessionToken) -> bool {
        self.session.as_ref().is_some_and(|s| s.token == token)
    }

    fn live_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    fn transition(&mut self, to: PlaybackState) {
        if self.state != to {
            debug!(from = ?self.state, to = ?to, "playback state");
            self.state = to;
        }
    }

    fn persist(&mut self) {
        save_playlist(self.store.as_mut(), self.playlist.tracks());
    }

    fn notify_current(&mut self) {
        if let Some(track) = self.playlist.current_track() {
            let meta = NowPlayingMetadata::from(track);
            self.now_playing.update_metadata(&meta);
        }
    }

    /// Stop and release the live binding, if any. Its token is dead afterwards.
    fn teardown(&mut self) {
        self.monitor.stop();
        if let Some(session) = self.session.take() {
            if let Err(e) = self.engine.stop(session.token) {
                debug!(error = %e, "stop during teardown");
            }
            if let Err(e) = self.engine.release(session.token) {
                debug!(error = %e, "release during teardown");
            }
        }
        self.progress = Progress::default();
    }

    fn fail(&mut self, err: EngineError) {
        error!(error = %err, "playback failed");
        self.monitor.stop();
        if let Some(session) = self.session.take() {
            if let Err(e) = self.engine.release(session.token) {
                debug!(error = %e, "release after failure");
            }
        }
        self.last_error = Some(err.into());
        self.transition(PlaybackState::Error);
        self.now_playing.stopped();
    }

    /// Tear down whatever plays and start loading the track at `index`.
    pub fn play_index(&mut self, index: usize) {
        let Some(path) = self.playlist.get(index).map(|t| t.path.clone()) else {
            debug!(index, "play_index out of range");
            return;
        };
        self.teardown();
        self.playlist.set_current(index);

        self.last_token = self.last_token.next();
        let token = self.last_token;
        let duration = self.playlist.get(index).map_or(0, |t| t.duration);
        self.session = Some(PlaybackSession::new(token, duration));
        self.last_error = None;
        self.transition(PlaybackState::Loading);
        info!(index, %token, path = %path.display(), "loading track");

        if let Err(e) = self.engine.load(token, &path) {
            self.fail(e);
        }
    }

    pub fn play(&mut self) {
        match (self.state, self.live_token()) {
            (PlaybackState::Playing | PlaybackState::Loading, Some(_)) => {}
            (PlaybackState::Paused, Some(token)) => {
                if let Err(e) = self.engine.play(token) {
                    self.fail(e);
                    return;
                }
                self.monitor.start();
                self.transition(PlaybackState::Playing);
                self.now_playing.update_is_playing(true);
            }
            _ => {
                if let Some(i) = self.playlist.current() {
                    self.play_index(i);
                }
            }
        }
    }

    pub fn pause(&mut self) {
        let Some(token) = self.live_token() else {
            return;
        };
        if self.state != PlaybackState::Playing {
            return;
        }
        if let Err(e) = self.engine.pause(token) {
            self.fail(e);
            return;
        }
        self.monitor.stop();
        self.transition(PlaybackState::Paused);
        self.now_playing.update_is_playing(false);
    }

    pub fn play_pause(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Idle && self.session.is_none() {
            return;
        }
        self.teardown();
        self.transition(PlaybackState::Idle);
        self.now_playing.clear();
    }

    fn skip(&mut self, direction: Direction) {
        let len = self.playlist.len();
        let current = self.playlist.current().unwrap_or(0);
        if let Some(i) = select_next(len, current, &self.selection, direction, &mut self.rng) {
            self.play_index(i);
        }
    }

    pub fn next(&mut self) {
        self.skip(Direction::Forward);
    }

    pub fn previous(&mut self) {
        self.skip(Direction::Backward);
    }

    fn seek_to_ms(&mut self, token: SessionToken, ms: u64) -> Result<(), PlayerError> {
        self.engine.seek_to(token, ms)?;
        let secs = ms / 1000;
        let duration = self.current_duration();
        if let Some(s) = self.session.as_mut() {
            s.position_secs = secs;
        }
        self.progress = derive_progress(secs as f64, duration);
        Ok(())
    }

    /// Seek to `percent` of the current track. A no-op without a session.
    pub fn seek_percent(&mut self, percent: u8) -> Result<(), PlayerError> {
        let Some(token) = self.live_token() else {
            return Ok(());
        };
        let duration = self.current_duration();
        if duration == 0 {
            return Err(PlayerError::DurationUnknown);
        }
        self.seek_to_ms(token, seek_target_ms(percent, duration))
    }

    /// Scrub by `delta` seconds, clamped to the track.
    pub fn seek_by(&mut self, delta: i64) -> Result<(), PlayerError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let (token, position) = (session.token, session.position_secs);
        let duration = self.current_duration();
        if duration == 0 {
            return Err(PlayerError::DurationUnknown);
        }
        self.seek_to_ms(token, scrub_target_ms(position, delta, duration))
    }

    /// Add a track at the end. The first track of an empty list starts playing.
    pub fn append(&mut self, track: Track) {
        self.metadata.request(&track.path);
        let index = self.playlist.append(track);
        self.persist();
        if index == 0 {
            self.play_index(0);
        }
    }

    pub fn append_paths<S: AsRef<str>>(&mut self, inputs: &[S]) {
        let paths = expand_inputs(inputs, &self.library);
        info!(count = paths.len(), "adding tracks");
        for path in paths {
            self.append(Track::from_path(path));
        }
    }

    pub fn remove(&mut self, index: usize) {
        if index >= self.playlist.len() {
            return;
        }
        if self.playlist.current() == Some(index) {
            self.teardown();
            self.transition(PlaybackState::Idle);
            self.now_playing.clear();
        }
        if self.playlist.remove(index) != Removal::Ignored {
            self.persist();
        }
    }

    pub fn move_track(&mut self, from: usize, to: usize) {
        if self.playlist.move_track(from, to) {
            self.persist();
        }
    }

    fn engine_event(&mut self, ev: EngineEvent) {
        match ev {
            EngineEvent::Ready { token, duration } => {
                if self.state != PlaybackState::Loading {
                    debug!(%token, state = ?self.state, "ready outside of loading");
                    return;
                }
                if let Some(d) = duration {
                    self.cache_duration(d);
                }
                if let Err(e) = self.engine.play(token) {
                    self.fail(e);
                    return;
                }
                self.monitor.start();
                self.transition(PlaybackState::Playing);
                self.notify_current();
                self.now_playing.update_is_playing(true);
            }
            EngineEvent::Position {
                position, duration, ..
            } => {
                if let Some(d) = duration {
                    self.cache_duration(d);
                }
                if let Some(pos) = position {
                    let progress = derive_progress(pos, self.current_duration());
                    if let Some(s) = self.session.as_mut() {
                        s.position_secs = progress.elapsed_secs;
                    }
                    self.progress = progress;
                }
            }
            EngineEvent::Finished { token } => {
                if self.state != PlaybackState::Playing {
                    debug!(%token, state = ?self.state, "finished outside of playing");
                    return;
                }
                self.monitor.stop();
                self.transition(PlaybackState::Completed);
                self.complete();
            }
            EngineEvent::Failed { error, .. } => self.fail(error),
            EngineEvent::SeekFailed { error, .. } => {
                warn!(error = %error, "seek failed");
                self.last_error = Some(error.into());
            }
        }
    }

    fn complete(&mut self) {
        let len = self.playlist.len();
        let current = self.playlist.current().unwrap_or(0);
        match select_after_completion(len, current, &self.selection, &mut self.rng) {
            Some(i) => self.play_index(i),
            None => {
                info!("end of playlist");
                self.teardown();
                self.transition(PlaybackState::Idle);
                self.now_playing.stopped();
            }
        }
    }

    fn tick(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(token) = self.live_token() else {
            return;
        };
        if let Err(e) = self.engine.query_position(token) {
            self.fail(e);
        }
    }

    /// Record a duration reported by the engine if none was known.
    fn cache_duration(&mut self, secs: f64) {
        if !secs.is_finite() || secs < 1.0 {
            return;
        }
        let secs = secs.floor() as u64;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.duration_secs > 0 {
            return;
        }
        session.duration_secs = secs;

        let mut changed = false;
        if let Some(i) = self.playlist.current() {
            if let Some(track) = self.playlist.get_mut(i).filter(|t| !t.has_duration()) {
                track.duration = secs;
                changed = true;
            }
        }
        if changed {
            debug!(secs, "duration resolved");
            self.persist();
            if self.state.is_playing() {
                self.notify_current();
            }
        }
    }

    fn apply_tags(&mut self, path: &Path, tags: &TagData) {
        let hits: Vec<usize> = self.playlist.positions_of(path).collect();
        let mut changed = false;
        for i in &hits {
            if let Some(track) = self.playlist.get_mut(*i) {
                changed |= tags.apply_to(track);
            }
        }
        if !changed {
            return;
        }
        self.persist();

        let current = self.playlist.current();
        if current.is_some_and(|c| hits.contains(&c)) && self.session.is_some() {
            if let Some(d) = self.current_track().map(|t| t.duration) {
                if let Some(s) = self.session.as_mut().filter(|s| s.duration_secs == 0) {
                    s.duration_secs = d;
                }
            }
            if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                self.notify_current();
            }
        }
    }

    /// Stop playing, write the final snapshot and shut the engine down.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.transition(PlaybackState::Idle);
        self.persist();
        self.engine.shutdown();
        self.now_playing.clear();
        info!("player shut down");
    }
}
