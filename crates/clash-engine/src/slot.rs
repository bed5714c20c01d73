//! Validated half-open time slots and ISO 8601 instant parsing.
//!
//! A [`TimeSlot`] is `[start, end)` in UTC with an optional resource (venue)
//! tag. Construction rejects zero-length and inverted slots, so every slot
//! in circulation has a strictly positive duration.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Date-time layouts accepted at the boundary, with or without a zone suffix.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Numeric UTC offset suffixes: `+05:30`, `+0530`, `+05`.
const OFFSET_SUFFIXES: &[&str] = &["%:z", "%z", "%#z"];

/// A half-open interval `[start, end)` optionally booked against a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSlot")]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
}

impl TimeSlot {
    /// Build a slot, rejecting `start >= end`.
    ///
    /// A blank resource string is treated as "no resource".
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resource: Option<String>,
    ) -> Result<Self> {
        if start >= end {
            return Err(ScheduleError::invalid("Start time must be before end time"));
        }
        Ok(Self {
            start,
            end,
            resource: normalize_resource(resource),
        })
    }

    /// Parse both bounds from ISO 8601 strings and build a slot.
    pub fn parse(start: &str, end: &str, resource: Option<&str>) -> Result<Self> {
        let start = parse_instant(start)?;
        let end = parse_instant(end)?;
        Self::new(start, end, resource.map(str::to_string))
    }

    /// A slot of `duration` beginning at `start`.
    pub fn starting_at(
        start: DateTime<Utc>,
        duration: Duration,
        resource: Option<String>,
    ) -> Result<Self> {
        let end = start
            .checked_add_signed(duration)
            .ok_or_else(|| ScheduleError::invalid("Slot end is out of range"))?;
        Self::new(start, end, resource)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The same slot moved by `offset`, keeping duration and resource.
    pub fn shifted(&self, offset: Duration) -> Result<Self> {
        let start = self
            .start
            .checked_add_signed(offset)
            .ok_or_else(|| ScheduleError::invalid("Shifted slot is out of range"))?;
        Self::starting_at(start, self.duration(), self.resource.clone())
    }

    /// The same interval booked against a different resource.
    pub fn with_resource(&self, resource: Option<String>) -> Self {
        Self {
            start: self.start,
            end: self.end,
            resource: normalize_resource(resource),
        }
    }
}

fn normalize_resource(resource: Option<String>) -> Option<String> {
    resource
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

/// Wire shape of a slot; converted through [`TimeSlot::new`] so stored data
/// cannot smuggle in an inverted interval.
#[derive(Deserialize)]
struct RawSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default)]
    resource: Option<String>,
}

impl TryFrom<RawSlot> for TimeSlot {
    type Error = ScheduleError;

    fn try_from(raw: RawSlot) -> Result<Self> {
        TimeSlot::new(raw.start, raw.end, raw.resource)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())?;
        if let Some(resource) = &self.resource {
            write!(f, " @ {}", resource)?;
        }
        Ok(())
    }
}

/// Parse an ISO 8601 datetime string into a UTC instant.
///
/// Accepts RFC 3339, minute or second precision with a `Z` or numeric offset
/// (`+05:30`, `+0530`, `+05`), naive datetimes (interpreted as UTC, `T` or
/// space separated, optional seconds and fraction) and bare dates (midnight
/// UTC).
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // `Z` on a form RFC 3339 rejects, e.g. minute precision
    let (body, zulu) = match s.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        Some(body) => (body, true),
        None => (s, false),
    };

    if !zulu {
        for layout in DATETIME_FORMATS {
            for suffix in OFFSET_SUFFIXES {
                let format = format!("{layout}{suffix}");
                if let Ok(dt) = DateTime::parse_from_str(s, &format) {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(body, format) {
            return Ok(ndt.and_utc());
        }
    }

    if !zulu {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }
    }

    Err(ScheduleError::invalid(format!(
        "Invalid datetime format: {}",
        input
    )))
}

/// Convert fractional hours into a `Duration`, rounded to the millisecond.
pub fn hours(value: f64) -> Result<Duration> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScheduleError::invalid(format!(
            "Duration must be a positive number of hours, got {}",
            value
        )));
    }
    let millis = (value * 3_600_000.0).round();
    if millis < 1.0 || millis > i64::MAX as f64 {
        return Err(ScheduleError::invalid(format!(
            "Duration out of range: {} hours",
            value
        )));
    }
    Duration::try_milliseconds(millis as i64)
        .ok_or_else(|| ScheduleError::invalid(format!("Duration out of range: {} hours", value)))
}
