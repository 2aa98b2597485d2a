use rand::Rng;

use crate::config::{PlaybackSettings, RepeatSetting, ShufflePolicySetting};

/// Governs what happens when a track ends on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop after the last track.
    #[default]
    Off,
    /// Wrap around to the first track.
    All,
    /// Replay the track that just ended.
    One,
}

impl RepeatMode {
    /// `Off -> All -> One -> Off`.
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Off",
            RepeatMode::All => "All",
            RepeatMode::One => "One",
        }
    }
}

impl From<RepeatSetting> for RepeatMode {
    fn from(s: RepeatSetting) -> Self {
        match s {
            RepeatSetting::Off => RepeatMode::Off,
            RepeatSetting::All => RepeatMode::All,
            RepeatSetting::One => RepeatMode::One,
        }
    }
}

/// How shuffle draws the next index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ShufflePolicy {
    /// Uniform over the whole list; the current track may come up again.
    #[default]
    PureRandom,
    /// Uniform over every entry except the current one (when there is another).
    AvoidCurrent,
}

impl From<ShufflePolicySetting> for ShufflePolicy {
    fn from(s: ShufflePolicySetting) -> Self {
        match s {
            ShufflePolicySetting::PureRandom => ShufflePolicy::PureRandom,
            ShufflePolicySetting::AvoidCurrent => ShufflePolicy::AvoidCurrent,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Process-wide selection flags read on every advance decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub policy: ShufflePolicy,
}

impl From<&PlaybackSettings> for SelectionState {
    fn from(s: &PlaybackSettings) -> Self {
        Self {
            shuffle: s.shuffle,
            repeat: s.repeat.into(),
            policy: s.shuffle_policy.into(),
        }
    }
}

impl SelectionState {
    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
    }

    pub fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.cycle();
    }
}

fn random_index<R: Rng + ?Sized>(len: usize, current: usize, policy: ShufflePolicy, rng: &mut R) -> usize {
    match policy {
        ShufflePolicy::AvoidCurrent if len > 1 && current < len => {
            let pick = rng.random_range(0..len - 1);
            if pick >= current { pick + 1 } else { pick }
        }
        _ => rng.random_range(0..len),
    }
}

/// Index for a user-initiated next/previous. `None` only for an empty list.
///
/// Repeat mode plays no part here: without shuffle the list wraps in both
/// directions.
pub fn select_next<R: Rng + ?Sized>(
    len: usize,
    current: usize,
    selection: &SelectionState,
    direction: Direction,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if selection.shuffle {
        return Some(random_index(len, current, selection.policy, rng));
    }
    let current = current.min(len - 1);
    Some(match direction {
        Direction::Forward => (current + 1) % len,
        Direction::Backward => (current + len - 1) % len,
    })
}

/// Index to load after the current track ended on its own, or `None` when
/// playback should stop.
pub fn select_after_completion<R: Rng + ?Sized>(
    len: usize,
    current: usize,
    selection: &SelectionState,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match selection.repeat {
        RepeatMode::One => Some(current.min(len - 1)),
        RepeatMode::All => select_next(len, current, selection, Direction::Forward, rng),
        RepeatMode::Off if current + 1 < len => {
            select_next(len, current, selection, Direction::Forward, rng)
        }
        RepeatMode::Off => None,
    }
}
