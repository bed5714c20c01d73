//! Conflict checking against the committed events in an [`EventStore`].
//!
//! The checker owns the resource-scoping decision: with
//! [`ResourceScope::SameResource`] two slots booked against different venues
//! never conflict, while a slot with no venue is compared against everything.
//! The interval math itself lives in [`crate::conflict`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::conflict::overlaps;
use crate::error::{Result, ScheduleError};
use crate::event::{CommittedEvent, EventId};
use crate::slot::TimeSlot;
use crate::store::{sort_by_start, EventStore, WindowQuery};

/// Which slot pairs the overlap rule is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceScope {
    /// Distinct named resources run concurrently; an unnamed slot is
    /// compared against every resource.
    #[default]
    SameResource,
    /// Every slot is compared against every other slot, venue or not.
    Universal,
}

impl ResourceScope {
    /// Whether two slots with these resources are subject to the overlap rule.
    pub fn applies(self, a: Option<&str>, b: Option<&str>) -> bool {
        match self {
            ResourceScope::Universal => true,
            ResourceScope::SameResource => match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            },
        }
    }

    /// Scoped conflict: the overlap rule, applied only where the scope says so.
    pub fn conflicts(self, a: &TimeSlot, b: &TimeSlot) -> bool {
        self.applies(a.resource(), b.resource()) && overlaps(a, b)
    }

    /// Resource filter to hand the store for a proposed slot.
    pub fn resource_filter(self, resource: Option<&str>) -> Option<String> {
        match self {
            ResourceScope::Universal => None,
            ResourceScope::SameResource => resource.map(str::to_string),
        }
    }
}

/// One or more committed events overlapping a proposed slot.
///
/// `all` is ordered by `(start, id)` and its first element is the primary.
#[derive(Debug, Clone, PartialEq)]
pub struct Clash {
    all: Vec<CommittedEvent>,
}

impl Clash {
    /// Order the conflicts deterministically; `None` when there are none.
    pub fn from_conflicts(mut conflicts: Vec<CommittedEvent>) -> Option<Self> {
        if conflicts.is_empty() {
            return None;
        }
        sort_by_start(&mut conflicts);
        Some(Self { all: conflicts })
    }

    /// The conflicting event with the earliest start (ties: lowest id).
    pub fn primary(&self) -> &CommittedEvent {
        &self.all[0]
    }

    pub fn all(&self) -> &[CommittedEvent] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictResult {
    Clear,
    Clash(Clash),
    /// The check could not be completed. Never to be read as `Clear`.
    Error { reason: String },
}

impl ConflictResult {
    pub fn is_clear(&self) -> bool {
        matches!(self, ConflictResult::Clear)
    }

    /// Wire status: `CLEAR`, `CLASH` or `ERROR`.
    pub fn status(&self) -> &'static str {
        match self {
            ConflictResult::Clear => "CLEAR",
            ConflictResult::Clash(_) => "CLASH",
            ConflictResult::Error { .. } => "ERROR",
        }
    }
}

impl From<Result<Vec<CommittedEvent>>> for ConflictResult {
    fn from(outcome: Result<Vec<CommittedEvent>>) -> Self {
        match outcome {
            Ok(conflicts) => match Clash::from_conflicts(conflicts) {
                Some(clash) => ConflictResult::Clash(clash),
                None => ConflictResult::Clear,
            },
            Err(e) => ConflictResult::Error {
                reason: e.to_string(),
            },
        }
    }
}

/// Read-only conflict detection over an injected store.
#[derive(Clone)]
pub struct ConflictChecker {
    store: Arc<dyn EventStore>,
    scope: ResourceScope,
    timeout: Option<Duration>,
}

impl ConflictChecker {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            scope: ResourceScope::default(),
            timeout: None,
        }
    }

    pub fn with_scope(mut self, scope: ResourceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Bound every check by `timeout`; `None` waits on the store indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scope(&self) -> ResourceScope {
        self.scope
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check `proposed` and fold the outcome into a [`ConflictResult`].
    pub async fn check(&self, proposed: &TimeSlot, exclude: Option<&EventId>) -> ConflictResult {
        self.conflicts(proposed, exclude).await.into()
    }

    /// Check a slot given as raw ISO 8601 boundary strings.
    ///
    /// Unparseable or inverted input yields `ConflictResult::Error`.
    pub async fn check_raw(
        &self,
        start: &str,
        end: &str,
        resource: Option<&str>,
        exclude: Option<&str>,
    ) -> ConflictResult {
        let proposed = match TimeSlot::parse(start, end, resource) {
            Ok(slot) => slot,
            Err(e) => {
                return ConflictResult::Error {
                    reason: e.to_string(),
                }
            }
        };
        let exclude = exclude.map(EventId::from);
        self.check(&proposed, exclude.as_ref()).await
    }

    /// All scheduled events conflicting with `proposed`, ordered by
    /// `(start, id)`, bounded by the configured timeout.
    pub async fn conflicts(
        &self,
        proposed: &TimeSlot,
        exclude: Option<&EventId>,
    ) -> Result<Vec<CommittedEvent>> {
        bounded(self.timeout, self.scan(proposed, exclude)).await
    }

    /// Unbounded scan; callers that already hold an outer deadline use this.
    pub(crate) async fn scan(
        &self,
        proposed: &TimeSlot,
        exclude: Option<&EventId>,
    ) -> Result<Vec<CommittedEvent>> {
        let query = WindowQuery::new(
            proposed.start(),
            proposed.end(),
            self.scope.resource_filter(proposed.resource()),
        );

        let candidates = self.store.candidates(&query).await.map_err(|e| {
            tracing::warn!(slot = %proposed, error = %e, "conflict check failed: store error");
            ScheduleError::from(e)
        })?;

        let mut conflicts: Vec<CommittedEvent> = candidates
            .into_iter()
            .filter(|event| event.is_scheduled())
            .filter(|event| exclude != Some(&event.id))
            .filter(|event| self.scope.conflicts(proposed, &event.slot))
            .collect();
        sort_by_start(&mut conflicts);

        tracing::debug!(
            slot = %proposed,
            exclude = exclude.map(EventId::as_str),
            conflicts_found = conflicts.len(),
            "conflict check"
        );

        Ok(conflicts)
    }
}

/// Run `fut` under an optional deadline, mapping expiry to `Timeout`.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "operation timed out");
                Err(ScheduleError::Timeout(limit))
            }
        },
        None => fut.await,
    }
}
