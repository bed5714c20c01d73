//! Tests for time slot construction and ISO 8601 parsing.

use chrono::{Duration, TimeZone, Utc};
use clash_engine::slot::hours;
use clash_engine::{parse_instant, ScheduleError, TimeSlot};

fn errors_of(err: ScheduleError) -> Vec<String> {
    match err {
        ScheduleError::Validation { errors } => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ── Construction ─────────────────────────────────────────────────────────────

#[test]
fn valid_slot_keeps_bounds_and_resource() {
    let slot =
        TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", Some("Room A")).unwrap();

    assert_eq!(slot.start(), Utc.with_ymd_and_hms(2025, 11, 8, 10, 0, 0).unwrap());
    assert_eq!(slot.end(), Utc.with_ymd_and_hms(2025, 11, 8, 12, 0, 0).unwrap());
    assert_eq!(slot.resource(), Some("Room A"));
    assert_eq!(slot.duration(), Duration::hours(2));
}

#[test]
fn zero_length_slot_rejected() {
    let err = TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T10:00:00Z", None).unwrap_err();
    assert_eq!(errors_of(err), vec!["Start time must be before end time"]);
}

#[test]
fn inverted_slot_rejected() {
    let err = TimeSlot::parse("2025-11-08T12:00:00Z", "2025-11-08T10:00:00Z", None).unwrap_err();
    assert_eq!(errors_of(err), vec!["Start time must be before end time"]);
}

#[test]
fn blank_resource_is_dropped() {
    let slot =
        TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T11:00:00Z", Some("  ")).unwrap();
    assert_eq!(slot.resource(), None);
}

#[test]
fn resource_is_trimmed() {
    let slot =
        TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", Some(" Hall ")).unwrap();
    assert_eq!(slot.resource(), Some("Hall"));
}

#[test]
fn shifted_keeps_duration_and_resource() {
    let slot =
        TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", Some("Room A")).unwrap();
    let moved = slot.shifted(Duration::hours(-3)).unwrap();

    assert_eq!(moved.start(), Utc.with_ymd_and_hms(2025, 11, 8, 7, 0, 0).unwrap());
    assert_eq!(moved.duration(), slot.duration());
    assert_eq!(moved.resource(), Some("Room A"));
}

#[test]
fn shift_out_of_range_is_an_error() {
    let slot = TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", None).unwrap();
    assert!(slot.shifted(Duration::MAX).is_err());
}

#[test]
fn display_shows_interval_and_resource() {
    let slot =
        TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", Some("Room A")).unwrap();
    assert_eq!(
        slot.to_string(),
        "[2025-11-08T10:00:00+00:00, 2025-11-08T12:00:00+00:00) @ Room A"
    );
}

// ── Serde ────────────────────────────────────────────────────────────────────

#[test]
fn deserialize_rejects_inverted_slot() {
    let json = r#"{"start":"2025-11-08T12:00:00Z","end":"2025-11-08T10:00:00Z"}"#;
    assert!(serde_json::from_str::<TimeSlot>(json).is_err());
}

#[test]
fn serialize_then_deserialize_preserves_slot() {
    let slot =
        TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", Some("Room A")).unwrap();
    let json = serde_json::to_string(&slot).unwrap();
    assert_eq!(serde_json::from_str::<TimeSlot>(&json).unwrap(), slot);
}

// ── parse_instant ────────────────────────────────────────────────────────────

#[test]
fn parses_zulu_and_offsets() {
    let expected = Utc.with_ymd_and_hms(2025, 11, 8, 10, 0, 0).unwrap();
    assert_eq!(parse_instant("2025-11-08T10:00:00Z").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08T12:00:00+02:00").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08T10:00:00.000Z").unwrap(), expected);

    // Minute precision and compact offsets
    assert_eq!(parse_instant("2025-11-08T10:00Z").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08T15:30+05:30").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08T15:30:00+0530").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08T05:00-05").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08 12:00+02:00").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08 10:00:00Z").unwrap(), expected);
}

#[test]
fn offset_input_is_normalized_to_utc() {
    assert_eq!(
        parse_instant("2025-11-08T10:00:00+05:30").unwrap(),
        Utc.with_ymd_and_hms(2025, 11, 8, 4, 30, 0).unwrap()
    );
}

#[test]
fn minute_precision_offsets_reach_slot_parsing() {
    let slot = TimeSlot::parse("2025-11-08T10:00Z", "2025-11-08T17:30+05:30", Some("Room A"))
        .unwrap();
    assert_eq!(slot.start(), Utc.with_ymd_and_hms(2025, 11, 8, 10, 0, 0).unwrap());
    assert_eq!(slot.end(), Utc.with_ymd_and_hms(2025, 11, 8, 12, 0, 0).unwrap());
}

#[test]
fn parses_naive_forms_as_utc() {
    let expected = Utc.with_ymd_and_hms(2025, 11, 8, 10, 0, 0).unwrap();
    assert_eq!(parse_instant("2025-11-08T10:00:00").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08T10:00").unwrap(), expected);
    assert_eq!(parse_instant("2025-11-08 10:00:00").unwrap(), expected);
    assert_eq!(parse_instant("  2025-11-08T10:00:00Z  ").unwrap(), expected);
}

#[test]
fn bare_date_is_midnight() {
    assert_eq!(
        parse_instant("2025-11-08").unwrap(),
        Utc.with_ymd_and_hms(2025, 11, 8, 0, 0, 0).unwrap()
    );
}

#[test]
fn garbage_is_rejected_with_input_echoed() {
    let err = parse_instant("next tuesday").unwrap_err();
    assert_eq!(errors_of(err), vec!["Invalid datetime format: next tuesday"]);

    assert!(parse_instant("2025-11-08Z").is_err());
    assert!(parse_instant("2025-11-08T10Z").is_err());
}

// ── Fractional hours ─────────────────────────────────────────────────────────

#[test]
fn fractional_hours_round_to_millis() {
    assert_eq!(hours(1.5).unwrap(), Duration::minutes(90));
    assert_eq!(hours(0.25).unwrap(), Duration::minutes(15));
}

#[test]
fn non_positive_or_non_finite_hours_are_rejected() {
    assert!(hours(0.0).is_err());
    assert!(hours(-1.0).is_err());
    assert!(hours(f64::NAN).is_err());
    assert!(hours(f64::INFINITY).is_err());
}
