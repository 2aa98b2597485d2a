use super::*;
use crate::library::{Artwork, Track};

fn sample() -> Vec<Track> {
    let mut a = Track::from_path("/music/a.flac");
    a.title = "Alpha".into();
    a.artist = "Band".into();
    a.album = "Record".into();
    a.duration = 200;
    a.art = Artwork::Inline {
        mime: "image/png".into(),
        data: vec![1, 2, 3, 4],
    };
    let mut b = Track::from_path("/music/b.mp3");
    b.art = Artwork::Uri("file:///music/cover.jpg".into());
    vec![a, b, Track::from_path("/music/c.ogg")]
}

#[test]
fn memory_store_round_trip_preserves_order_and_fields() {
    let mut store = MemoryStore::new();
    let tracks = sample();
    save_playlist(&mut store, &tracks);
    assert_eq!(load_playlist(&store), tracks);
}

#[test]
fn file_store_round_trip_and_atomic_replace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/store.json");
    let mut store = FileStore::new(&path);
    let tracks = sample();
    save_playlist(&mut store, &tracks);
    save_playlist(&mut store, &tracks[..1]);

    let reopened = FileStore::new(&path);
    assert_eq!(load_playlist(&reopened), tracks[..1].to_vec());
    assert!(!dir.path().join("nested/store.json.tmp").exists());
}

#[test]
fn missing_key_or_file_gives_empty_playlist() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("absent.json"));
    assert!(load_playlist(&store).is_empty());
    assert!(load_playlist(&MemoryStore::new()).is_empty());
}

#[test]
fn malformed_value_gives_empty_playlist() {
    let mut store = MemoryStore::new();
    store.set(PLAYLIST_KEY, "{not json").unwrap();
    assert!(load_playlist(&store).is_empty());

    store.set(PLAYLIST_KEY, r#"{"path": "/x.mp3"}"#).unwrap();
    assert!(load_playlist(&store).is_empty());
}

#[test]
fn corrupt_store_file_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "garbage").unwrap();

    let mut store = FileStore::new(&path);
    assert!(load_playlist(&store).is_empty());
    save_playlist(&mut store, &sample());
    assert_eq!(load_playlist(&store).len(), 3);
}

#[test]
fn sparse_entries_fill_defaults() {
    let mut store = MemoryStore::new();
    store
        .set(PLAYLIST_KEY, r#"[{"path": "/music/song.mp3"}]"#)
        .unwrap();
    let tracks = load_playlist(&store);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].name, "song.mp3");
    assert_eq!(tracks[0].title, "song.mp3");
    assert_eq!(tracks[0].duration, 0);
    assert_eq!(tracks[0].art, Artwork::Placeholder);
}

#[test]
fn stored_form_uses_data_uri_for_inline_art() {
    let stored = StoredTrack::from(&sample()[0]);
    assert_eq!(stored.art, "data:image/png;base64,AQIDBA==");
    let json = serde_json::to_value(&stored).unwrap();
    for key in ["path", "name", "title", "artist", "album", "duration", "art"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}
