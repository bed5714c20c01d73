//! Committed events: the records the store holds and conflict checks compare against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::TimeSlot;

/// Opaque, unique identifier of a committed event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// A fresh random (UUID v4) id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state. Only `Scheduled` events take part in conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Cancelled,
}

/// Optional descriptive fields supplied at creation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    pub organizer: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub capacity: Option<u32>,
    pub budget: Option<f64>,
}

/// A validated creation request: everything the transaction needs before
/// it touches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub slot: TimeSlot,
    pub metadata: EventMetadata,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            title: title.into(),
            slot,
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// An event the store has accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedEvent {
    pub id: EventId,
    pub title: String,
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub organizer: String,
    pub description: String,
    pub category: String,
    pub capacity: u32,
    pub budget: f64,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommittedEvent {
    /// Materialize a draft as a new scheduled event with a fresh id.
    ///
    /// Missing metadata falls back to empty organizer/description, category
    /// `general`, zero capacity and zero budget.
    pub fn from_draft(draft: EventDraft, now: DateTime<Utc>) -> Self {
        let EventDraft {
            title,
            slot,
            metadata,
        } = draft;
        Self {
            id: EventId::generate(),
            title,
            slot,
            organizer: metadata.organizer.unwrap_or_default(),
            description: metadata.description.unwrap_or_default(),
            category: metadata
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "general".to_string()),
            capacity: metadata.capacity.unwrap_or(0),
            budget: metadata.budget.unwrap_or(0.0),
            status: EventStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == EventStatus::Scheduled
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.slot.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.slot.end()
    }

    pub fn resource(&self) -> Option<&str> {
        self.slot.resource()
    }
}
