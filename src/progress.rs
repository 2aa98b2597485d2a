//! Position polling and the arithmetic around it.

mod monitor;

pub use monitor::{ProgressMonitor, TickSink};

/// Normalized progress of the live session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    pub elapsed_secs: u64,
    /// `0..=100`; `0` while the duration is unknown.
    pub percent: u8,
}

/// Derive progress from an engine position and a known duration (seconds).
pub fn derive_progress(position_secs: f64, duration_secs: u64) -> Progress {
    let elapsed_secs = if position_secs.is_finite() && position_secs > 0.0 {
        position_secs.floor() as u64
    } else {
        0
    };
    let percent = if duration_secs == 0 {
        0
    } else {
        (elapsed_secs.saturating_mul(100) / duration_secs).min(100) as u8
    };
    Progress {
        elapsed_secs,
        percent,
    }
}

/// Absolute seek target in milliseconds for `percent` of `duration_secs`.
/// The target is truncated to whole seconds.
pub fn seek_target_ms(percent: u8, duration_secs: u64) -> u64 {
    let percent = u64::from(percent.min(100));
    percent * duration_secs / 100 * 1000
}

/// Absolute target for a relative scrub, clamped to the track.
pub fn scrub_target_ms(elapsed_secs: u64, delta_secs: i64, duration_secs: u64) -> u64 {
    let target = elapsed_secs.saturating_add_signed(delta_secs);
    target.min(duration_secs) * 1000
}
