//! Alternative slot search around a rejected start time.
//!
//! Probes a fixed sequence of hour offsets around the preferred start and keeps
//! the first slots that check clear. The default order prefers small positive
//! shifts, then small negative ones, then larger jumps, and a full day last.
//! Each probe is an independent read; nothing is reserved.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::{bounded, ConflictChecker};
use crate::error::{Result, ScheduleError};
use crate::slot::TimeSlot;

/// Default probe sequence, in hours relative to the preferred start.
pub const DEFAULT_OFFSETS_HOURS: [i64; 12] = [1, 2, -1, 3, -2, 4, -3, 6, -6, 12, -12, 24];

/// A clear slot proposed in place of the preferred one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub slot: TimeSlot,
    pub offset_hours: i64,
    /// Always 1.0: the slot passed a live conflict check when returned.
    pub confidence: f64,
    pub reasoning: String,
}

impl Suggestion {
    fn new(slot: TimeSlot, offset_hours: i64) -> Self {
        Self {
            slot,
            offset_hours,
            confidence: 1.0,
            reasoning: format!("Available slot {:+}h from preferred time", offset_hours),
        }
    }
}

/// Searches nearby start times using a [`ConflictChecker`].
#[derive(Clone)]
pub struct AlternativeSlotFinder {
    checker: ConflictChecker,
    offsets_hours: Vec<i64>,
}

impl AlternativeSlotFinder {
    pub fn new(checker: ConflictChecker) -> Self {
        Self {
            checker,
            offsets_hours: DEFAULT_OFFSETS_HOURS.to_vec(),
        }
    }

    /// Replace the probe sequence. Order is preserved as given.
    pub fn with_offsets(mut self, offsets_hours: Vec<i64>) -> Self {
        self.offsets_hours = offsets_hours;
        self
    }

    pub fn offsets_hours(&self) -> &[i64] {
        &self.offsets_hours
    }

    /// Up to `max_results` clear slots of `duration`, in probe order.
    ///
    /// Exhausting the offsets early is not an error; the result may be empty.
    /// A store failure or timeout aborts the whole search rather than
    /// returning a partial list.
    pub async fn suggest(
        &self,
        preferred_start: DateTime<Utc>,
        duration: Duration,
        resource: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<Suggestion>> {
        if duration <= Duration::zero() {
            return Err(ScheduleError::invalid(
                "Duration must be a positive number of hours",
            ));
        }
        let preferred = TimeSlot::starting_at(
            preferred_start,
            duration,
            resource.map(str::to_string),
        )?;

        bounded(self.checker.timeout(), self.probe(&preferred, max_results)).await
    }

    async fn probe(&self, preferred: &TimeSlot, max_results: usize) -> Result<Vec<Suggestion>> {
        let mut suggestions = Vec::new();

        for &offset_hours in &self.offsets_hours {
            if suggestions.len() >= max_results {
                break;
            }
            let Some(offset) = Duration::try_hours(offset_hours) else {
                continue;
            };
            // Offsets that leave chrono's range are skipped, not fatal.
            let Ok(candidate) = preferred.shifted(offset) else {
                continue;
            };

            if self.checker.scan(&candidate, None).await?.is_empty() {
                suggestions.push(Suggestion::new(candidate, offset_hours));
            }
        }

        tracing::debug!(
            preferred = %preferred,
            found = suggestions.len(),
            "alternative slot search"
        );
        Ok(suggestions)
    }
}
