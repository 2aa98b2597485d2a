//! Durable playlist snapshots over a small key-value store.

mod snapshot;
mod store;

pub use snapshot::{PLAYLIST_KEY, StoredTrack, load_playlist, save_playlist};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

#[cfg(test)]
mod tests;
