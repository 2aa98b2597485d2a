use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::config::LibrarySettings;
use crate::engine::{EngineEvent, PlaybackEngine, SessionToken};
use crate::error::{EngineError, PlayerError};
use crate::library::{MetadataSource, TagData, Track};
use crate::persist::{MemoryStore, load_playlist, save_playlist};
use crate::progress::{Progress, ProgressMonitor};
use crate::selection::{RepeatMode, SelectionState, ShufflePolicy};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(SessionToken, PathBuf),
    Play(SessionToken),
    Pause(SessionToken),
    Stop(SessionToken),
    Release(SessionToken),
    Query(SessionToken),
    Seek(SessionToken, u64),
    Shutdown,
}

#[derive(Clone, Default)]
struct FakeEngine {
    calls: Rc<RefCell<Vec<Call>>>,
    broken: Rc<Cell<bool>>,
    refuse_release: Rc<Cell<bool>>,
}

impl FakeEngine {
    fn record(&self, call: Call) -> Result<(), EngineError> {
        if self.broken.get() {
            return Err(EngineError::Disconnected);
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl PlaybackEngine for FakeEngine {
    fn load(&mut self, token: SessionToken, path: &Path) -> Result<(), EngineError> {
        self.record(Call::Load(token, path.to_path_buf()))
    }
    fn play(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.record(Call::Play(token))
    }
    fn pause(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.record(Call::Pause(token))
    }
    fn stop(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.record(Call::Stop(token))
    }
    fn release(&mut self, token: SessionToken) -> Result<(), EngineError> {
        if self.refuse_release.get() {
            return Err(EngineError::Runtime("sink already gone".into()));
        }
        self.record(Call::Release(token))
    }
    fn query_position(&mut self, token: SessionToken) -> Result<(), EngineError> {
        self.record(Call::Query(token))
    }
    fn seek_to(&mut self, token: SessionToken, ms: u64) -> Result<(), EngineError> {
        self.record(Call::Seek(token, ms))
    }
    fn shutdown(&mut self) {
        self.calls.borrow_mut().push(Call::Shutdown);
    }
}

#[derive(Clone, Default)]
struct RecordingMetadata {
    requested: Rc<RefCell<Vec<PathBuf>>>,
}

impl MetadataSource for RecordingMetadata {
    fn request(&self, path: &Path) {
        self.requested.borrow_mut().push(path.to_path_buf());
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Note {
    Meta(String, u64),
    Playing(bool),
    Stopped,
    Clear,
}

#[derive(Clone, Default)]
struct RecordingNowPlaying {
    notes: Rc<RefCell<Vec<Note>>>,
}

impl NowPlaying for RecordingNowPlaying {
    fn update_metadata(&mut self, meta: &NowPlayingMetadata) {
        self.notes
            .borrow_mut()
            .push(Note::Meta(meta.title.clone(), meta.length_secs));
    }
    fn update_is_playing(&mut self, playing: bool) {
        self.notes.borrow_mut().push(Note::Playing(playing));
    }
    fn stopped(&mut self) {
        self.notes.borrow_mut().push(Note::Stopped);
    }
    fn clear(&mut self) {
        self.notes.borrow_mut().push(Note::Clear);
    }
}

struct Harness {
    ctl: Controller,
    engine: FakeEngine,
    metadata: RecordingMetadata,
    notes: RecordingNowPlaying,
    store: MemoryStore,
}

impl Harness {
    fn calls(&self) -> Vec<Call> {
        self.engine.calls.borrow().clone()
    }

    fn loads(&self) -> Vec<(SessionToken, PathBuf)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Load(t, p) => Some((t, p)),
                _ => None,
            })
            .collect()
    }

    fn last_token(&self) -> SessionToken {
        self.loads().last().map(|(t, _)| *t).expect("nothing loaded")
    }

    fn engine_event(&mut self, ev: EngineEvent) {
        self.ctl.handle(Event::Engine(ev));
    }

    fn ready(&mut self, duration: Option<f64>) -> SessionToken {
        let token = self.last_token();
        self.engine_event(EngineEvent::Ready { token, duration });
        token
    }

    fn command(&mut self, cmd: Command) {
        self.ctl.handle(Event::Command(cmd));
    }

    fn notes(&self) -> Vec<Note> {
        self.notes.notes.borrow().clone()
    }

    fn saved(&self) -> Vec<Track> {
        load_playlist(&self.store)
    }
}

fn harness_with(names: &[&str], selection: SelectionState) -> Harness {
    let mut store = MemoryStore::new();
    if !names.is_empty() {
        let tracks: Vec<Track> = names
            .iter()
            .map(|n| Track::from_path(format!("/music/{n}.mp3")))
            .collect();
        save_playlist(&mut store, &tracks);
    }
    let engine = FakeEngine::default();
    let metadata = RecordingMetadata::default();
    let notes = RecordingNowPlaying::default();
    let monitor = ProgressMonitor::new(Duration::from_secs(3600), Arc::new(|_| {}));

    let ctl = Controller::new(
        Collaborators {
            engine: Box::new(engine.clone()),
            monitor,
            store: Box::new(store.clone()),
            metadata: Box::new(metadata.clone()),
            now_playing: Box::new(notes.clone()),
        },
        selection,
        LibrarySettings::default(),
        StdRng::seed_from_u64(3),
    );
    Harness {
        ctl,
        engine,
        metadata,
        notes,
        store,
    }
}

fn harness(names: &[&str]) -> Harness {
    harness_with(names, SelectionState::default())
}

fn with_repeat(repeat: RepeatMode) -> SelectionState {
    SelectionState {
        shuffle: false,
        repeat,
        policy: ShufflePolicy::PureRandom,
    }
}

fn song(name: &str) -> PathBuf {
    PathBuf::from(format!("/music/{name}.mp3"))
}

#[test]
fn restore_requests_metadata_without_playing() {
    let h = harness(&["a", "b"]);
    assert_eq!(h.ctl.playlist().len(), 2);
    assert_eq!(h.ctl.playlist().current(), Some(0));
    assert_eq!(h.ctl.state(), PlaybackState::Idle);
    assert_eq!(*h.metadata.requested.borrow(), vec![song("a"), song("b")]);
    assert!(h.calls().is_empty());
}

#[test]
fn first_append_persists_requests_tags_and_autoplays() {
    let mut h = harness(&[]);
    h.ctl.append(Track::from_path("/a/song1.mp3"));

    assert_eq!(h.ctl.playlist().len(), 1);
    assert_eq!(h.ctl.playlist().current(), Some(0));
    assert_eq!(*h.metadata.requested.borrow(), vec![PathBuf::from("/a/song1.mp3")]);
    assert_eq!(h.saved().len(), 1);
    assert_eq!(h.ctl.state(), PlaybackState::Loading);
    assert_eq!(h.loads(), vec![(SessionToken(1), PathBuf::from("/a/song1.mp3"))]);

    let token = h.ready(Some(200.0));
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
    assert!(h.calls().contains(&Call::Play(token)));
    assert_eq!(
        h.notes(),
        vec![Note::Meta("song1.mp3".into(), 200), Note::Playing(true)]
    );

    // A second append neither interrupts nor reloads.
    h.ctl.append(Track::from_path("/a/song2.mp3"));
    assert_eq!(h.loads().len(), 1);
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
}

#[test]
fn append_paths_expands_directories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.mp3"), b"x").unwrap();
    std::fs::write(dir.path().join("a.flac"), b"x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let mut h = harness(&[]);
    let input = dir.path().to_string_lossy().into_owned();
    h.command(Command::AppendPaths(vec![input, "/no/such/file.mp3".into()]));

    let names: Vec<&str> = h
        .ctl
        .playlist()
        .tracks()
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["a.flac", "b.mp3"]);
    assert_eq!(h.loads().len(), 1);
    assert_eq!(h.saved().len(), 2);
}

#[test]
fn repeat_one_reloads_the_same_track() {
    let mut h = harness_with(&["a", "b"], with_repeat(RepeatMode::One));
    h.ctl.play_index(0);
    let first = h.ready(None);
    h.engine_event(EngineEvent::Finished { token: first });

    let loads = h.loads();
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[1].1, song("a"));
    assert!(loads[1].0 > first);
    assert_eq!(h.ctl.state(), PlaybackState::Loading);
    assert_eq!(h.ctl.playlist().current(), Some(0));
}

#[test]
fn repeat_off_stops_after_the_last_track() {
    let mut h = harness_with(&["a", "b"], with_repeat(RepeatMode::Off));
    h.ctl.play_index(1);
    let token = h.ready(None);
    h.engine_event(EngineEvent::Finished { token });

    assert_eq!(h.ctl.state(), PlaybackState::Idle);
    assert!(h.ctl.session().is_none());
    assert_eq!(h.loads().len(), 1);
    assert_eq!(h.notes().last(), Some(&Note::Stopped));
}

#[test]
fn repeat_off_advances_mid_list_and_repeat_all_wraps() {
    let mut h = harness_with(&["a", "b"], with_repeat(RepeatMode::Off));
    h.ctl.play_index(0);
    let token = h.ready(None);
    h.engine_event(EngineEvent::Finished { token });
    assert_eq!(h.loads().last().unwrap().1, song("b"));

    let mut h = harness_with(&["a", "b"], with_repeat(RepeatMode::All));
    h.ctl.play_index(1);
    let token = h.ready(None);
    h.engine_event(EngineEvent::Finished { token });
    assert_eq!(h.loads().last().unwrap().1, song("a"));
    assert_eq!(h.ctl.playlist().current(), Some(0));
}

#[test]
fn events_for_a_replaced_session_are_discarded() {
    let mut h = harness(&["a", "b"]);
    h.ctl.play_index(0);
    let old = h.last_token();
    h.ctl.play_index(1);
    let new = h.last_token();
    assert_ne!(old, new);
    assert!(h.calls().contains(&Call::Stop(old)));
    assert!(h.calls().contains(&Call::Release(old)));

    h.engine_event(EngineEvent::Ready { token: old, duration: Some(10.0) });
    h.engine_event(EngineEvent::Failed { token: old, error: EngineError::Runtime("x".into()) });
    h.engine_event(EngineEvent::Finished { token: old });
    h.engine_event(EngineEvent::Position { token: old, position: Some(5.0), duration: None });

    assert_eq!(h.ctl.state(), PlaybackState::Loading);
    assert!(!h.calls().contains(&Call::Play(old)));
    assert!(h.ctl.last_error().is_none());
    assert_eq!(h.ctl.progress(), Progress::default());

    h.engine_event(EngineEvent::Ready { token: new, duration: None });
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
}

#[test]
fn late_events_from_a_replaced_session_leave_progress_and_duration_alone() {
    let mut h = harness(&["a", "b"]);
    h.ctl.play_index(0);
    let old = h.last_token();
    h.ctl.play_index(1);
    let new = h.ready(Some(200.0));
    h.engine_event(EngineEvent::Position {
        token: new,
        position: Some(50.4),
        duration: Some(200.0),
    });
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
    let before = h.ctl.progress();
    assert_eq!(before, Progress { elapsed_secs: 50, percent: 25 });

    h.engine_event(EngineEvent::Position {
        token: old,
        position: Some(170.0),
        duration: Some(999.0),
    });
    h.engine_event(EngineEvent::Finished { token: old });

    assert_eq!(h.ctl.state(), PlaybackState::Playing);
    assert_eq!(h.ctl.progress(), before);
    assert_eq!(h.ctl.session().unwrap().duration_secs, 200);
    assert_eq!(h.ctl.session().unwrap().position_secs, 50);
    assert_eq!(h.ctl.current_track().unwrap().duration, 200);
    assert_eq!(h.ctl.playlist().get(0).unwrap().duration, 0);
}

#[test]
fn seek_half_of_two_hundred_seconds_goes_to_100000_ms() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.ready(Some(200.0));
    h.command(Command::SeekPercent(50));
    assert!(h.calls().contains(&Call::Seek(token, 100_000)));
    assert_eq!(h.ctl.progress().percent, 50);
}

#[test]
fn seek_by_clamps_to_track_bounds() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.ready(Some(30.0));
    h.command(Command::SeekBy(-5));
    h.command(Command::SeekBy(100));
    let seeks: Vec<Call> = h
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Seek(..)))
        .collect();
    assert_eq!(seeks, vec![Call::Seek(token, 0), Call::Seek(token, 30_000)]);
}

#[test]
fn seek_without_duration_is_rejected() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    h.ready(None);
    h.command(Command::SeekPercent(50));
    assert_eq!(h.ctl.last_error(), Some(&PlayerError::DurationUnknown));
    assert!(!h.calls().iter().any(|c| matches!(c, Call::Seek(..))));
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
}

#[test]
fn seek_failure_is_reported_and_state_kept() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.ready(Some(100.0));
    h.engine_event(EngineEvent::SeekFailed {
        token,
        error: EngineError::SeekUnsupported("not seekable".into()),
    });
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
    assert!(matches!(
        h.ctl.last_error(),
        Some(PlayerError::Engine(EngineError::SeekUnsupported(_)))
    ));
}

#[test]
fn removing_the_current_track_tears_down_and_goes_idle() {
    let mut h = harness(&["a", "b", "c"]);
    h.ctl.play_index(1);
    let token = h.ready(None);
    h.command(Command::Remove(1));

    assert_eq!(h.ctl.state(), PlaybackState::Idle);
    assert!(h.ctl.session().is_none());
    assert!(h.calls().contains(&Call::Stop(token)));
    assert!(h.calls().contains(&Call::Release(token)));
    assert_eq!(h.ctl.playlist().current(), Some(1));
    assert_eq!(h.ctl.current_track().unwrap().path, song("c"));
    assert_eq!(h.notes().last(), Some(&Note::Clear));
    assert_eq!(h.saved().len(), 2);
}

#[test]
fn removing_another_track_keeps_playing() {
    let mut h = harness(&["a", "b", "c"]);
    h.ctl.play_index(2);
    h.ready(None);
    h.command(Command::Remove(0));
    h.command(Command::Remove(7));
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
    assert_eq!(h.ctl.current_track().unwrap().path, song("c"));
    assert_eq!(h.saved().len(), 2);
}

#[test]
fn move_keeps_current_identity_and_persists() {
    let mut h = harness(&["a", "b", "c"]);
    h.ctl.play_index(2);
    h.command(Command::Move { from: 2, to: 0 });
    assert_eq!(h.ctl.playlist().current(), Some(0));
    assert_eq!(h.ctl.current_track().unwrap().path, song("c"));
    assert_eq!(h.saved()[0].path, song("c"));
}

#[test]
fn engine_failure_enters_error_and_play_retries() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.last_token();
    h.engine_event(EngineEvent::Failed {
        token,
        error: EngineError::Construction {
            path: song("a"),
            reason: "bad header".into(),
        },
    });
    assert_eq!(h.ctl.state(), PlaybackState::Error);
    assert!(h.ctl.last_error().unwrap().is_engine_failure());
    assert!(h.calls().contains(&Call::Release(token)));
    assert_eq!(h.loads().len(), 1);
    assert_eq!(h.notes().last(), Some(&Note::Stopped));

    h.command(Command::Play);
    assert_eq!(h.loads().len(), 2);
    assert_eq!(h.ctl.state(), PlaybackState::Loading);
    assert!(h.ctl.last_error().is_none());
}

#[test]
fn failed_release_after_an_error_keeps_the_original_error() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.last_token();
    h.engine.refuse_release.set(true);
    h.engine_event(EngineEvent::Failed {
        token,
        error: EngineError::Runtime("device lost".into()),
    });

    assert_eq!(h.ctl.state(), PlaybackState::Error);
    assert!(h.ctl.session().is_none());
    assert_eq!(
        h.ctl.last_error(),
        Some(&PlayerError::Engine(EngineError::Runtime("device lost".into())))
    );
    assert_eq!(h.notes().last(), Some(&Note::Stopped));
}

#[test]
fn unreachable_engine_surfaces_as_error() {
    let mut h = harness(&["a"]);
    h.engine.broken.set(true);
    h.command(Command::Play);
    assert_eq!(h.ctl.state(), PlaybackState::Error);
    assert_eq!(
        h.ctl.last_error(),
        Some(&PlayerError::Engine(EngineError::Disconnected))
    );
}

#[test]
fn ticks_poll_only_while_playing_and_only_current_generation() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.ready(Some(200.0));

    h.ctl.handle(Event::Tick { generation: 0 });
    assert!(!h.calls().contains(&Call::Query(token)));
    h.ctl.handle(Event::Tick { generation: 1 });
    assert!(h.calls().contains(&Call::Query(token)));

    h.engine_event(EngineEvent::Position {
        token,
        position: Some(59.9),
        duration: Some(200.0),
    });
    assert_eq!(
        h.ctl.progress(),
        Progress {
            elapsed_secs: 59,
            percent: 29
        }
    );

    h.command(Command::PlayPause);
    assert_eq!(h.ctl.state(), PlaybackState::Paused);
    assert!(h.calls().contains(&Call::Pause(token)));
    let queries = |h: &Harness| h.calls().iter().filter(|c| matches!(c, Call::Query(_))).count();
    let before = queries(&h);
    h.ctl.handle(Event::Tick { generation: 1 });
    assert_eq!(queries(&h), before);
    assert_eq!(h.ctl.progress().elapsed_secs, 59);

    h.command(Command::PlayPause);
    assert_eq!(h.ctl.state(), PlaybackState::Playing);
    h.ctl.handle(Event::Tick { generation: 2 });
    assert_eq!(queries(&h), before + 1);
}

#[test]
fn engine_reported_duration_is_cached_and_saved() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.ready(None);
    h.engine_event(EngineEvent::Position {
        token,
        position: Some(10.2),
        duration: Some(183.7),
    });
    assert_eq!(h.ctl.current_track().unwrap().duration, 183);
    assert_eq!(h.ctl.session().unwrap().duration_secs, 183);
    assert_eq!(h.saved()[0].duration, 183);
    assert_eq!(h.ctl.progress().percent, 5);
}

#[test]
fn tags_update_tracks_and_errors_are_swallowed() {
    let mut h = harness(&["a", "b"]);
    h.ctl.handle(Event::Metadata {
        path: song("b"),
        result: Ok(TagData {
            title: Some("Bee".into()),
            artist: Some("Band".into()),
            ..TagData::default()
        }),
    });
    assert_eq!(h.ctl.playlist().get(1).unwrap().title, "Bee");
    assert_eq!(h.saved()[1].artist, "Band");

    h.ctl.handle(Event::Metadata {
        path: song("a"),
        result: Err(PlayerError::MetadataRead {
            path: song("a"),
            reason: "no tags".into(),
        }),
    });
    assert!(h.ctl.last_error().is_none());
    assert_eq!(h.ctl.playlist().get(0).unwrap().title, "a.mp3");
}

#[test]
fn idle_commands_are_no_ops() {
    let mut h = harness(&[]);
    h.command(Command::Pause);
    h.command(Command::Stop);
    h.command(Command::Play);
    h.command(Command::Next);
    h.command(Command::SeekPercent(10));
    assert!(h.calls().is_empty());
    assert_eq!(h.ctl.state(), PlaybackState::Idle);
    assert!(h.notes().is_empty());
}

#[test]
fn next_and_previous_wrap() {
    let mut h = harness(&["a", "b", "c"]);
    h.command(Command::Previous);
    assert_eq!(h.loads().last().unwrap().1, song("c"));
    h.command(Command::Next);
    assert_eq!(h.loads().last().unwrap().1, song("a"));
}

#[test]
fn toggles_flip_selection_state() {
    let mut h = harness(&["a"]);
    h.command(Command::ToggleShuffle);
    h.command(Command::CycleRepeat);
    assert!(h.ctl.selection().shuffle);
    assert_eq!(h.ctl.selection().repeat, RepeatMode::All);
}

#[test]
fn stop_clears_surface_and_shutdown_stops_engine() {
    let mut h = harness(&["a"]);
    h.ctl.play_index(0);
    let token = h.ready(None);
    h.command(Command::Stop);
    assert_eq!(h.ctl.state(), PlaybackState::Idle);
    assert!(h.calls().contains(&Call::Release(token)));
    assert_eq!(h.notes().last(), Some(&Note::Clear));

    h.ctl.shutdown();
    assert_eq!(h.calls().last(), Some(&Call::Shutdown));
}
