use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{
    blocking_events, sort_by_start, EventStore, Insertion, ListFilter, StoreResult, WindowQuery,
};
use crate::checker::ResourceScope;
use crate::error::StoreError;
use crate::event::{CommittedEvent, EventId, EventStatus};

/// In-process event store with a per-resource start-time index.
///
/// Scheduled events are bucketed by resource. Each bucket keeps its events
/// ordered by `(start, id)` and remembers the longest duration it has seen,
/// so a window query only visits events starting in
/// `[window.start - longest, window.end)`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Index>,
}

#[derive(Default)]
struct Index {
    events: HashMap<EventId, CommittedEvent>,
    buckets: HashMap<Option<String>, Bucket>,
}

#[derive(Default)]
struct Bucket {
    by_start: BTreeSet<(DateTime<Utc>, EventId)>,
    // Never shrinks; a stale upper bound only widens the scan.
    longest: Duration,
}

impl Bucket {
    fn insert(&mut self, event: &CommittedEvent) {
        self.by_start.insert((event.start(), event.id.clone()));
        self.longest = self.longest.max(event.slot.duration());
    }

    fn remove(&mut self, event: &CommittedEvent) {
        self.by_start.remove(&(event.start(), event.id.clone()));
    }

    fn intersecting<'a>(
        &'a self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a EventId> + 'a {
        let floor = start
            .checked_sub_signed(self.longest)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let lower = Bound::Included((floor, EventId::from("")));
        let upper = Bound::Excluded((end, EventId::from("")));
        self.by_start.range((lower, upper)).map(|(_, id)| id)
    }
}

impl Index {
    fn insert(&mut self, event: CommittedEvent) {
        if event.is_scheduled() {
            self.buckets
                .entry(event.resource().map(str::to_string))
                .or_default()
                .insert(&event);
        }
        self.events.insert(event.id.clone(), event);
    }

    fn query(&self, query: &WindowQuery) -> Vec<CommittedEvent> {
        let buckets: Vec<&Bucket> = match &query.resource {
            Some(resource) => [Some(resource.clone()), None]
                .iter()
                .filter_map(|key| self.buckets.get(key))
                .collect(),
            None => self.buckets.values().collect(),
        };

        let mut found: Vec<CommittedEvent> = buckets
            .into_iter()
            .flat_map(|bucket| bucket.intersecting(query.start, query.end))
            .filter_map(|id| self.events.get(id))
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        sort_by_start(&mut found);
        found
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `events`, written as-is without conflict checks.
    pub fn with_events(events: impl IntoIterator<Item = CommittedEvent>) -> Self {
        let mut index = Index::default();
        for event in events {
            index.insert(event);
        }
        Self {
            inner: RwLock::new(index),
        }
    }

    /// Number of stored events, cancelled ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.events.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn candidates(&self, query: &WindowQuery) -> StoreResult<Vec<CommittedEvent>> {
        Ok(self.inner.read().await.query(query))
    }

    async fn insert_if_clear(
        &self,
        event: CommittedEvent,
        scope: ResourceScope,
    ) -> StoreResult<Insertion> {
        let mut index = self.inner.write().await;

        let query = WindowQuery::new(
            event.start(),
            event.end(),
            scope.resource_filter(event.resource()),
        );
        let candidates = index.query(&query);
        let blocking = blocking_events(&candidates, &event, scope);
        if !blocking.is_empty() {
            return Ok(Insertion::Rejected(blocking));
        }

        index.insert(event.clone());
        Ok(Insertion::Inserted(event))
    }

    async fn get(&self, id: &EventId) -> StoreResult<Option<CommittedEvent>> {
        Ok(self.inner.read().await.events.get(id).cloned())
    }

    async fn list(&self, filter: &ListFilter) -> StoreResult<Vec<CommittedEvent>> {
        let index = self.inner.read().await;
        let mut events: Vec<CommittedEvent> = index
            .events
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        sort_by_start(&mut events);
        Ok(events)
    }

    async fn cancel(&self, id: &EventId) -> StoreResult<CommittedEvent> {
        let mut guard = self.inner.write().await;
        let index = &mut *guard;

        let event = index
            .events
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if event.status == EventStatus::Cancelled {
            return Ok(event.clone());
        }

        event.status = EventStatus::Cancelled;
        event.updated_at = Utc::now();
        let key = event.resource().map(str::to_string);
        if let Some(bucket) = index.buckets.get_mut(&key) {
            bucket.remove(event);
        }
        Ok(event.clone())
    }
}
