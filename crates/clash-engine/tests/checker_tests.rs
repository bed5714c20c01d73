//! Tests for resource-scoped conflict checking against a store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use clash_engine::store::{Insertion, ListFilter, StoreResult, WindowQuery};
use clash_engine::{
    CommittedEvent, ConflictChecker, ConflictResult, EventDraft, EventId, EventStore,
    MemoryStore, ResourceScope, StoreError, TimeSlot,
};

fn slot(start_hour: u32, end_hour: u32, venue: Option<&str>) -> TimeSlot {
    TimeSlot::new(
        Utc.with_ymd_and_hms(2025, 11, 8, start_hour, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 11, 8, end_hour, 0, 0).unwrap(),
        venue.map(str::to_string),
    )
    .unwrap()
}

fn committed(id: &str, title: &str, slot: TimeSlot) -> CommittedEvent {
    let mut event = CommittedEvent::from_draft(EventDraft::new(title, slot), Utc::now());
    event.id = EventId::from(id);
    event
}

/// Room A holds a keynote 10:00-12:00.
fn room_a_checker() -> ConflictChecker {
    let store = MemoryStore::with_events([committed(
        "keynote",
        "Keynote",
        slot(10, 12, Some("Room A")),
    )]);
    ConflictChecker::new(Arc::new(store))
}

fn clash_of(result: ConflictResult) -> clash_engine::Clash {
    match result {
        ConflictResult::Clash(clash) => clash,
        other => panic!("expected CLASH, got {other:?}"),
    }
}

/// A store whose every call fails.
struct BrokenStore;

#[async_trait]
impl EventStore for BrokenStore {
    async fn candidates(&self, _: &WindowQuery) -> StoreResult<Vec<CommittedEvent>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn insert_if_clear(&self, _: CommittedEvent, _: ResourceScope) -> StoreResult<Insertion> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn get(&self, _: &EventId) -> StoreResult<Option<CommittedEvent>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn list(&self, _: &ListFilter) -> StoreResult<Vec<CommittedEvent>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn cancel(&self, id: &EventId) -> StoreResult<CommittedEvent> {
        Err(StoreError::NotFound(id.clone()))
    }
}

/// A store that never answers a candidate query.
struct HangingStore;

#[async_trait]
impl EventStore for HangingStore {
    async fn candidates(&self, _: &WindowQuery) -> StoreResult<Vec<CommittedEvent>> {
        tokio::time::sleep(StdDuration::from_secs(3600)).await;
        Ok(Vec::new())
    }
    async fn insert_if_clear(&self, e: CommittedEvent, _: ResourceScope) -> StoreResult<Insertion> {
        Ok(Insertion::Inserted(e))
    }
    async fn get(&self, _: &EventId) -> StoreResult<Option<CommittedEvent>> {
        Ok(None)
    }
    async fn list(&self, _: &ListFilter) -> StoreResult<Vec<CommittedEvent>> {
        Ok(Vec::new())
    }
    async fn cancel(&self, id: &EventId) -> StoreResult<CommittedEvent> {
        Err(StoreError::NotFound(id.clone()))
    }
}

// ── Room A scenarios ─────────────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_slot_same_room_clashes_with_keynote() {
    let result = room_a_checker()
        .check(&slot(11, 13, Some("Room A")), None)
        .await;

    assert_eq!(result.status(), "CLASH");
    let clash = clash_of(result);
    assert_eq!(clash.primary().title, "Keynote");
    assert_eq!(clash.len(), 1);
}

#[tokio::test]
async fn back_to_back_slot_is_clear() {
    let result = room_a_checker()
        .check(&slot(12, 14, Some("Room A")), None)
        .await;
    assert_eq!(result, ConflictResult::Clear);
}

#[tokio::test]
async fn different_room_is_clear() {
    let result = room_a_checker()
        .check(&slot(11, 13, Some("Room B")), None)
        .await;
    assert!(result.is_clear());
}

#[tokio::test]
async fn different_room_clashes_under_universal_scope() {
    let checker = room_a_checker().with_scope(ResourceScope::Universal);
    let result = checker.check(&slot(11, 13, Some("Room B")), None).await;
    assert_eq!(result.status(), "CLASH");
}

#[tokio::test]
async fn slot_without_venue_is_checked_against_every_room() {
    let result = room_a_checker().check(&slot(11, 13, None), None).await;
    assert_eq!(clash_of(result).primary().title, "Keynote");
}

#[tokio::test]
async fn empty_store_is_clear() {
    let checker = ConflictChecker::new(Arc::new(MemoryStore::new()));
    let result = checker.check(&slot(9, 17, Some("Room A")), None).await;
    assert_eq!(result, ConflictResult::Clear);
}

#[tokio::test]
async fn repeated_checks_agree() {
    let checker = room_a_checker();
    let proposed = slot(11, 13, Some("Room A"));

    let first = checker.check(&proposed, None).await;
    let second = checker.check(&proposed, None).await;
    assert_eq!(first, second, "a check must not change the store");
}

// ── Exclusion and status ─────────────────────────────────────────────────────

#[tokio::test]
async fn excluded_event_is_ignored() {
    let checker = room_a_checker();
    let exclude = EventId::from("keynote");

    let result = checker
        .check(&slot(11, 13, Some("Room A")), Some(&exclude))
        .await;
    assert!(result.is_clear(), "an event never conflicts with itself");
}

#[tokio::test]
async fn cancelled_events_do_not_block() {
    let store = Arc::new(MemoryStore::with_events([committed(
        "keynote",
        "Keynote",
        slot(10, 12, Some("Room A")),
    )]));
    store.cancel(&EventId::from("keynote")).await.unwrap();

    let checker = ConflictChecker::new(store);
    let result = checker.check(&slot(10, 12, Some("Room A")), None).await;
    assert!(result.is_clear());
}

// ── Ordering ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn primary_is_earliest_start_then_lowest_id() {
    let store = MemoryStore::with_events([
        committed("c", "Late", slot(11, 12, Some("Hall"))),
        committed("b", "Early B", slot(9, 11, Some("Hall"))),
        committed("a", "Early A", slot(9, 10, Some("Hall"))),
    ]);
    let checker = ConflictChecker::new(Arc::new(store));

    let clash = clash_of(checker.check(&slot(8, 13, Some("Hall")), None).await);

    let ids: Vec<&str> = clash.all().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(clash.primary().title, "Early A");
}

// ── Failure modes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_failure_is_error_never_clear() {
    let checker = ConflictChecker::new(Arc::new(BrokenStore));
    let result = checker.check(&slot(10, 11, Some("Room A")), None).await;

    match result {
        ConflictResult::Error { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected ERROR, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_as_error() {
    let checker = ConflictChecker::new(Arc::new(HangingStore))
        .with_timeout(Some(StdDuration::from_millis(50)));

    let result = checker.check(&slot(10, 11, Some("Room A")), None).await;

    assert_eq!(result.status(), "ERROR");
}

#[tokio::test]
async fn raw_check_reports_bad_input_as_error() {
    let checker = room_a_checker();

    let inverted = checker
        .check_raw("2025-11-08T12:00:00Z", "2025-11-08T10:00:00Z", Some("Room A"), None)
        .await;
    assert_eq!(inverted.status(), "ERROR");

    let garbage = checker.check_raw("soon", "later", None, None).await;
    assert_eq!(garbage.status(), "ERROR");
}

#[tokio::test]
async fn raw_check_honours_exclusion() {
    let checker = room_a_checker();
    let result = checker
        .check_raw(
            "2025-11-08T11:00:00Z",
            "2025-11-08T13:00:00Z",
            Some("Room A"),
            Some("keynote"),
        )
        .await;
    assert!(result.is_clear());
}
