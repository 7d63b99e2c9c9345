use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A wall-clock instant recorded on an author or committer line.
///
/// Ordering compares the UTC instant first and the offset second, so two
/// timestamps taken in different zones still sort by real time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Milliseconds since the UNIX epoch (UTC).
    pub epoch_ms: u64,
    /// Offset from UTC in minutes, as recorded by the writer.
    pub tz_offset_min: i16,
}

impl Timestamp {
    pub fn new(epoch_ms: u64, tz_offset_min: i16) -> Self {
        Self {
            epoch_ms,
            tz_offset_min,
        }
    }

    /// The current wall-clock time with the given offset.
    pub fn now(tz_offset_min: i16) -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            epoch_ms,
            tz_offset_min,
        }
    }

    /// The current time, but never earlier than one millisecond past `prev`.
    ///
    /// Successive commits on the same edit must carry distinct committer
    /// timestamps even when they are written within the same millisecond.
    pub fn now_after(prev: &Self, tz_offset_min: i16) -> Self {
        let now = Self::now(tz_offset_min);
        if now.epoch_ms > prev.epoch_ms {
            now
        } else {
            Self {
                epoch_ms: prev.epoch_ms + 1,
                tz_offset_min,
            }
        }
    }

    pub const fn epoch() -> Self {
        Self {
            epoch_ms: 0,
            tz_offset_min: 0,
        }
    }

    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.epoch_ms
            .cmp(&other.epoch_ms)
            .then(self.tz_offset_min.cmp(&other.tz_offset_min))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

impl fmt::Display for Timestamp {
    /// Git-style `<seconds> <+hhmm>` rendering.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset_min < 0 { '-' } else { '+' };
        let offset = self.tz_offset_min.unsigned_abs();
        write!(
            f,
            "{} {}{:02}{:02}",
            self.epoch_ms / 1000,
            sign,
            offset / 60,
            offset % 60
        )
    }
}
