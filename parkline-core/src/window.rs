use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Half-open booking interval `[start, end)`.
///
/// Construction guarantees `start < end`, so every window handed to the
/// lifecycle manager has a positive duration.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if end <= start {
            return Err(CoreError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two windows overlap unless one ends at or before the other starts.
    /// Windows that merely touch (`a.end == b.start`) do not overlap.
    /// The overlap queries in `parkline-store`'s booking repository encode
    /// the same predicate in SQL and must change with it.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

impl<'de> Deserialize<'de> for TimeWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        }

        let raw = Raw::deserialize(deserializer)?;
        TimeWindow::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}
