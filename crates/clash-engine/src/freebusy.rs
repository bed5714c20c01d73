//! Free windows between busy slots.
//!
//! Sorts busy slots by start time, merges overlapping or touching periods,
//! then reports the gaps between merged periods within a given window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::slot::TimeSlot;

/// A gap with no conflicting booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

/// Merge overlapping or adjacent busy periods, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of (start, end) intervals.
pub fn merge_busy_periods(
    busy: &[TimeSlot],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .filter(|s| s.start() < window_end && s.end() > window_start)
        .map(|s| (s.start().max(window_start), s.end().min(window_end)))
        .collect();

    intervals.sort_unstable();

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(intervals.len());
    for (start, stop) in intervals {
        match merged.last_mut() {
            // Touching periods merge too: no bookable gap between them.
            Some((_, open_end)) if start <= *open_end => *open_end = (*open_end).max(stop),
            _ => merged.push((start, stop)),
        }
    }

    merged
}

/// Gaps of at least `min_duration` between `busy` slots inside the window,
/// sorted by start time.
pub fn find_free_windows(
    busy: &[TimeSlot],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_duration: Duration,
) -> Vec<FreeWindow> {
    let mut free = Vec::new();
    let mut cursor = window_start;

    let mut push = |start: DateTime<Utc>, end: DateTime<Utc>| {
        if end - start >= min_duration && start < end {
            free.push(FreeWindow {
                start,
                end,
                duration_minutes: (end - start).num_minutes(),
            });
        }
    };

    for (busy_start, busy_end) in merge_busy_periods(busy, window_start, window_end) {
        if cursor < busy_start {
            push(cursor, busy_start);
        }
        cursor = cursor.max(busy_end);
    }

    if cursor < window_end {
        push(cursor, window_end);
    }

    free
}
