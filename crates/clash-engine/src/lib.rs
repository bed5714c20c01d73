//! # clash-engine
//!
//! Clash-free venue scheduling core.
//!
//! Given a proposed time interval and venue, the engine decides against a
//! durable [`EventStore`] whether the interval conflicts with committed events,
//! proposes nearby alternatives when it does, and commits new events with an
//! at-most-one-winner guarantee under concurrent submissions.
//!
//! ## Modules
//!
//! - [`slot`] — `[start, end)` time slots and ISO 8601 parsing
//! - [`conflict`] — the pure overlap rule and pairwise overlap finder
//! - [`checker`] — resource-scoped conflict checking (`Clear` / `Clash` / `Error`)
//! - [`suggest`] — alternative slot search over a fixed offset sequence
//! - [`scheduler`] — race-safe event creation and the operation facade
//! - [`store`] — the event store trait plus in-memory and JSON file stores
//! - [`freebusy`] — free windows between busy slots
//! - [`audit`] — double-booking detection over stored events
//! - [`api`] — request/response types for the request layer
//! - [`config`] — TOML-loadable scheduler settings
//! - [`error`] — Error types
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use clash_engine::{EventDraft, MemoryStore, Scheduler, TimeSlot};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let scheduler = Scheduler::new(Arc::new(MemoryStore::new()));
//!
//! let slot = TimeSlot::parse("2025-11-08T10:00:00Z", "2025-11-08T12:00:00Z", Some("Room A")).unwrap();
//! scheduler.create_event(EventDraft::new("Keynote", slot)).await.unwrap();
//!
//! let overlapping = TimeSlot::parse("2025-11-08T11:00:00Z", "2025-11-08T13:00:00Z", Some("Room A")).unwrap();
//! assert_eq!(scheduler.check_conflict(&overlapping, None).await.status(), "CLASH");
//! # });
//! ```

pub mod api;
pub mod audit;
pub mod checker;
pub mod config;
pub mod conflict;
pub mod error;
pub mod event;
pub mod freebusy;
pub mod locks;
pub mod scheduler;
pub mod slot;
pub mod store;
pub mod suggest;

pub use checker::{Clash, ConflictChecker, ConflictResult, ResourceScope};
pub use config::SchedulerConfig;
pub use conflict::{find_overlapping_pairs, overlaps};
pub use error::{ConfigError, ScheduleError, StoreError};
pub use event::{CommittedEvent, EventDraft, EventId, EventMetadata, EventStatus};
pub use scheduler::Scheduler;
pub use slot::{parse_instant, TimeSlot};
pub use store::{EventStore, JsonFileStore, MemoryStore};
pub use suggest::{AlternativeSlotFinder, Suggestion};
