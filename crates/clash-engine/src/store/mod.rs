//! The durable event store the scheduler is built on.
//!
//! The core only needs two things from storage: "list scheduled candidates
//! for a time window / resource" and "insert if still clear". Everything else
//! here ([`EventStore::get`], [`EventStore::list`], [`EventStore::cancel`])
//! serves the surrounding request layer.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`] — indexed by resource and start time, for embedding and tests
//! - [`JsonFileStore`] — a JSON file guarded by an OS advisory lock, for the CLI

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::checker::ResourceScope;
use crate::error::StoreError;
use crate::event::{CommittedEvent, EventId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A time-range (and optionally resource) filter for candidate events.
///
/// An implementation must return every *scheduled* event whose interval
/// intersects `[start, end)`. When `resource` is set it may leave out events
/// booked against a different named resource, but must keep events that
/// carry no resource at all. Returning extra events is allowed; the checker
/// filters again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resource: Option<String>,
}

impl WindowQuery {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, resource: Option<String>) -> Self {
        Self {
            start,
            end,
            resource,
        }
    }

    /// Whether `event` satisfies this query.
    pub fn matches(&self, event: &CommittedEvent) -> bool {
        let resource_ok = match (&self.resource, event.resource()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        event.is_scheduled() && resource_ok && event.start() < self.end && self.start < event.end()
    }
}

/// Listing filter for the request layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only events booked against exactly this resource.
    pub resource: Option<String>,
    pub include_cancelled: bool,
}

impl ListFilter {
    pub fn scheduled() -> Self {
        Self::default()
    }

    pub fn matches(&self, event: &CommittedEvent) -> bool {
        let resource_ok = match &self.resource {
            Some(wanted) => event.resource() == Some(wanted.as_str()),
            None => true,
        };
        resource_ok && (self.include_cancelled || event.is_scheduled())
    }
}

/// Outcome of a conditional insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    Inserted(CommittedEvent),
    /// Another scheduled event got there first; nothing was written.
    Rejected(Vec<CommittedEvent>),
}

/// Durable collection of committed events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Scheduled events that may intersect `query` (see [`WindowQuery`]).
    async fn candidates(&self, query: &WindowQuery) -> StoreResult<Vec<CommittedEvent>>;

    /// Atomically re-validate `event` against the scheduled events under
    /// `scope` and insert it only if nothing conflicts.
    async fn insert_if_clear(
        &self,
        event: CommittedEvent,
        scope: ResourceScope,
    ) -> StoreResult<Insertion>;

    async fn get(&self, id: &EventId) -> StoreResult<Option<CommittedEvent>>;

    /// Events matching `filter`, ordered by `(start, id)`.
    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<CommittedEvent>>;

    /// Mark an event cancelled. Idempotent; the record is kept for audit.
    async fn cancel(&self, id: &EventId) -> StoreResult<CommittedEvent>;
}

/// Scheduled events in `existing` that `event` would conflict with under `scope`.
pub(crate) fn blocking_events<'a, I>(
    existing: I,
    event: &CommittedEvent,
    scope: ResourceScope,
) -> Vec<CommittedEvent>
where
    I: IntoIterator<Item = &'a CommittedEvent>,
{
    existing
        .into_iter()
        .filter(|other| other.is_scheduled() && other.id != event.id)
        .filter(|other| scope.conflicts(&event.slot, &other.slot))
        .cloned()
        .collect()
}

pub(crate) fn sort_by_start(events: &mut [CommittedEvent]) {
    events.sort_by(|a, b| (a.start(), &a.id).cmp(&(b.start(), &b.id)));
}
