//! The scheduling facade: conflict checks, suggestions and race-safe creation.
//!
//! Creation is the only mutation path. It validates the draft, takes the
//! per-resource lock, re-checks conflicts, then asks the store to insert only
//! if the slot is still clear. A store-level rejection means another writer
//! sharing the store won the race; the loser re-checks exactly once and
//! reports the clash.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::audit::{find_double_bookings, DoubleBooking};
use crate::checker::{bounded, Clash, ConflictChecker, ConflictResult};
use crate::config::SchedulerConfig;
use crate::error::{Result, ScheduleError, StoreError};
use crate::event::{CommittedEvent, EventDraft, EventId};
use crate::freebusy::{find_free_windows, FreeWindow};
use crate::locks::{LockKey, ResourceLocks};
use crate::slot::TimeSlot;
use crate::store::{EventStore, Insertion, ListFilter, WindowQuery};
use crate::suggest::{AlternativeSlotFinder, Suggestion};

pub struct Scheduler {
    store: Arc<dyn EventStore>,
    checker: ConflictChecker,
    finder: AlternativeSlotFinder,
    locks: ResourceLocks,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_config(store, SchedulerConfig::default())
    }

    pub fn with_config(store: Arc<dyn EventStore>, config: SchedulerConfig) -> Self {
        let checker = ConflictChecker::new(Arc::clone(&store))
            .with_scope(config.scope)
            .with_timeout(config.timeout());
        let finder =
            AlternativeSlotFinder::new(checker.clone()).with_offsets(config.offsets_hours.clone());
        Self {
            store,
            checker,
            finder,
            locks: ResourceLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn checker(&self) -> &ConflictChecker {
        &self.checker
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Read-only conflict check, optionally ignoring one event (an update
    /// checking against everything but itself).
    pub async fn check_conflict(
        &self,
        proposed: &TimeSlot,
        exclude: Option<&EventId>,
    ) -> ConflictResult {
        self.checker.check(proposed, exclude).await
    }

    /// Clear slots near `preferred_start`. `max_results` defaults to the
    /// configured `max_suggestions`.
    pub async fn suggest_alternatives(
        &self,
        preferred_start: DateTime<Utc>,
        duration: Duration,
        resource: Option<&str>,
        max_results: Option<usize>,
    ) -> Result<Vec<Suggestion>> {
        let max_results = max_results.unwrap_or(self.config.max_suggestions);
        self.finder
            .suggest(preferred_start, duration, resource, max_results)
            .await
    }

    /// Commit a new event if its slot is clear.
    ///
    /// Of several concurrent creations for mutually overlapping slots on one
    /// resource, exactly one succeeds; the rest fail with
    /// [`ScheduleError::Conflict`] naming the winner.
    pub async fn create_event(&self, draft: EventDraft) -> Result<CommittedEvent> {
        validate_draft(&draft)?;

        let scope = self.config.scope;
        let slot = draft.slot.clone();
        let key = LockKey::for_slot(scope, slot.resource());

        // The deadline covers waiting for the lock and the check, not the
        // insert: once the write is issued its outcome is reported as-is.
        let (_guard, conflicts) = bounded(self.checker.timeout(), async {
            let guard = self.locks.acquire(key).await;
            let conflicts = self.checker.scan(&slot, None).await?;
            Ok::<_, ScheduleError>((guard, conflicts))
        })
        .await?;

        if let Some(clash) = Clash::from_conflicts(conflicts) {
            tracing::info!(
                slot = %slot,
                primary = %clash.primary().id,
                conflicts = clash.len(),
                "event rejected: slot already booked"
            );
            return Err(ScheduleError::Conflict(clash));
        }

        let event = CommittedEvent::from_draft(draft, Utc::now());
        match self.store.insert_if_clear(event, scope).await? {
            Insertion::Inserted(event) => {
                tracing::info!(
                    event_id = %event.id,
                    title = %event.title,
                    slot = %event.slot,
                    "event created"
                );
                Ok(event)
            }
            Insertion::Rejected(blocking) => {
                tracing::warn!(slot = %slot, "lost creation race; re-checking once");
                let recheck = self.checker.conflicts(&slot, None).await?;
                let conflicts = if recheck.is_empty() { blocking } else { recheck };
                let clash = Clash::from_conflicts(conflicts).ok_or_else(|| {
                    StoreError::Malformed("insert rejected without a conflicting event".to_string())
                })?;
                Err(ScheduleError::Conflict(clash))
            }
        }
    }

    /// Cancel an event. It stays in the store but no longer blocks its slot.
    pub async fn cancel_event(&self, id: &EventId) -> Result<CommittedEvent> {
        let event = self.store.cancel(id).await?;
        tracing::info!(event_id = %event.id, "event cancelled");
        Ok(event)
    }

    pub async fn get_event(&self, id: &EventId) -> Result<Option<CommittedEvent>> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list_events(&self, filter: &ListFilter) -> Result<Vec<CommittedEvent>> {
        Ok(self.store.list(filter).await?)
    }

    /// Gaps of at least `min_duration` in `window` that a booking on the
    /// window's resource could use.
    pub async fn free_windows(
        &self,
        window: &TimeSlot,
        min_duration: Duration,
    ) -> Result<Vec<FreeWindow>> {
        let scope = self.config.scope;
        let query = WindowQuery::new(
            window.start(),
            window.end(),
            scope.resource_filter(window.resource()),
        );
        let candidates = bounded(self.checker.timeout(), async {
            Ok::<_, ScheduleError>(self.store.candidates(&query).await?)
        })
        .await?;

        let busy: Vec<TimeSlot> = candidates
            .into_iter()
            .filter(|e| e.is_scheduled() && scope.conflicts(window, &e.slot))
            .map(|e| e.slot)
            .collect();

        Ok(find_free_windows(
            &busy,
            window.start(),
            window.end(),
            min_duration,
        ))
    }

    /// Scheduled event pairs that violate the scope policy. Empty on a
    /// store only ever written through [`Scheduler::create_event`].
    pub async fn audit(&self) -> Result<Vec<DoubleBooking>> {
        let events = self.store.list(&ListFilter::scheduled()).await?;
        let found = find_double_bookings(&events, self.config.scope);
        if !found.is_empty() {
            tracing::warn!(double_bookings = found.len(), "audit found overlapping events");
        }
        Ok(found)
    }
}

/// Required fields for creation: a title and a venue. The slot itself is
/// already valid by construction.
fn validate_draft(draft: &EventDraft) -> Result<()> {
    let mut errors = Vec::new();
    if draft.title.trim().is_empty() {
        errors.push("Field 'title' is required".to_string());
    }
    if draft.slot.resource().is_none() {
        errors.push("Field 'venue' is required".to_string());
    }
    if let Some(budget) = draft.metadata.budget {
        if !budget.is_finite() || budget < 0.0 {
            errors.push("Field 'budget' must be a non-negative number".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ScheduleError::Validation { errors })
    }
}
