//! Watch-event time windows and conflict detection.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reelhouse_common::{AppError, AppResult};

/// Formats accepted besides RFC 3339. Read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Half-open interval `[start, end)` an event occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    #[must_use]
    pub fn new(start: DateTime<Utc>, duration_minutes: i32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(i64::from(duration_minutes)),
        }
    }

    /// Touching boundaries do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// First window in `existing` that overlaps `candidate`.
pub fn find_conflict<I>(candidate: &Window, existing: I) -> Option<Window>
where
    I: IntoIterator<Item = Window>,
{
    existing.into_iter().find(|w| candidate.overlaps(w))
}

/// Parse an event start time from a form value.
pub fn parse_event_datetime(raw: &str) -> AppResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::BadRequest("Invalid event date".to_string()))
}
