//! Serde-friendly request/response types for the request layer.
//!
//! Times cross this boundary as ISO 8601 strings and leave it as RFC 3339
//! UTC. Errors are returned as values ([`ErrorResponse`]) carrying the
//! status code the transport should use.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::checker::ConflictResult;
use crate::error::{Result, ScheduleError};
use crate::event::{CommittedEvent, EventDraft, EventId, EventMetadata, EventStatus};
use crate::scheduler::Scheduler;
use crate::slot::{self, parse_instant, TimeSlot};
use crate::suggest::Suggestion;

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Flat view of a committed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub venue: Option<String>,
    pub organizer: String,
    pub category: String,
    pub capacity: u32,
    pub budget: f64,
    pub status: EventStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CommittedEvent> for EventRecord {
    fn from(e: &CommittedEvent) -> Self {
        Self {
            id: e.id.to_string(),
            title: e.title.clone(),
            description: e.description.clone(),
            start_time: timestamp(e.start()),
            end_time: timestamp(e.end()),
            venue: e.resource().map(str::to_string),
            organizer: e.organizer.clone(),
            category: e.category.clone(),
            capacity: e.capacity,
            budget: e.budget,
            status: e.status,
            created_at: timestamp(e.created_at),
            updated_at: timestamp(e.updated_at),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConflictRequest {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub exclude_event_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResponse {
    /// `CLEAR`, `CLASH` or `ERROR`.
    pub status: String,
    /// Title of the primary conflicting event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_events: Option<Vec<EventRecord>>,
    pub message: String,
}

impl From<&ConflictResult> for ConflictResponse {
    fn from(result: &ConflictResult) -> Self {
        let status = result.status().to_string();
        match result {
            ConflictResult::Clear => Self {
                status,
                conflicting_event: None,
                conflicting_events: None,
                message: "Time slot is available".to_string(),
            },
            ConflictResult::Clash(clash) => Self {
                status,
                conflicting_event: Some(clash.primary().title.clone()),
                conflicting_events: Some(clash.all().iter().map(EventRecord::from).collect()),
                message: format!(
                    "Time slot conflicts with {} existing event(s)",
                    clash.len()
                ),
            },
            ConflictResult::Error { reason } => Self {
                status,
                conflicting_event: None,
                conflicting_events: None,
                message: format!("Failed to check conflicts: {}", reason),
            },
        }
    }
}

/// Creation input as it arrives from a client: every field optional so that
/// all missing ones can be reported together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub venue: Option<String>,
    pub organizer: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub capacity: Option<i64>,
    pub budget: Option<f64>,
}

impl CreateEventRequest {
    /// Validate every field and build a draft, or report all problems at once.
    pub fn into_draft(self) -> Result<EventDraft> {
        let mut errors = Vec::new();

        let title = non_blank(self.title.as_deref()).map(str::to_string);
        let start_raw = non_blank(self.start_time.as_deref());
        let end_raw = non_blank(self.end_time.as_deref());
        let venue = non_blank(self.venue.as_deref()).map(str::to_string);

        for (name, present) in [
            ("title", title.is_some()),
            ("start_time", start_raw.is_some()),
            ("end_time", end_raw.is_some()),
            ("venue", venue.is_some()),
        ] {
            if !present {
                errors.push(format!("Field '{}' is required", name));
            }
        }

        let mut parse = |name: &str, raw: Option<&str>| {
            let parsed = raw.map(parse_instant).transpose();
            parsed.unwrap_or_else(|_| {
                errors.push(format!("Field '{}' must be a valid datetime", name));
                None
            })
        };
        let start = parse("start_time", start_raw);
        let end = parse("end_time", end_raw);

        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                errors.push("Start time must be before end time".to_string());
            }
        }

        let capacity = match self.capacity {
            Some(c) if c < 0 => {
                errors.push("Field 'capacity' must not be negative".to_string());
                None
            }
            Some(c) => match u32::try_from(c) {
                Ok(c) => Some(c),
                Err(_) => {
                    errors.push("Field 'capacity' is too large".to_string());
                    None
                }
            },
            None => None,
        };
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                errors.push("Field 'budget' must be a non-negative number".to_string());
            }
        }

        if !errors.is_empty() {
            return Err(ScheduleError::Validation { errors });
        }

        let (Some(title), Some(start), Some(end)) = (title, start, end) else {
            return Err(ScheduleError::invalid("Incomplete event request"));
        };
        let slot = TimeSlot::new(start, end, venue)?;

        Ok(EventDraft::new(title, slot).with_metadata(EventMetadata {
            organizer: self.organizer,
            description: self.description,
            category: self.category,
            capacity,
            budget: self.budget,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub preferred_start: String,
    pub duration_hours: f64,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub max_suggestions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    pub start_time: String,
    pub end_time: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl From<&Suggestion> for SuggestionRecord {
    fn from(s: &Suggestion) -> Self {
        Self {
            start_time: timestamp(s.slot.start()),
            end_time: timestamp(s.slot.end()),
            confidence: s.confidence,
            reasoning: s.reasoning.clone(),
        }
    }
}

/// Structured failure for the transport to map onto its own status codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_events: Option<Vec<EventRecord>>,
}

impl From<&ScheduleError> for ErrorResponse {
    fn from(e: &ScheduleError) -> Self {
        let mut response = Self {
            kind: e.kind().to_string(),
            status_code: e.status_code(),
            message: e.to_string(),
            errors: Vec::new(),
            conflicting_event: None,
            conflicting_events: None,
        };
        match e {
            ScheduleError::Validation { errors } => response.errors = errors.clone(),
            ScheduleError::Conflict(clash) => {
                response.message = format!(
                    "Cannot create event: time slot conflicts with {} existing event(s)",
                    clash.len()
                );
                response.conflicting_event = Some(clash.primary().title.clone());
                response.conflicting_events =
                    Some(clash.all().iter().map(EventRecord::from).collect());
            }
            _ => {}
        }
        response
    }
}

impl Scheduler {
    /// `check_conflict` over raw boundary strings. Never fails: bad input and
    /// store trouble come back as `status: "ERROR"`.
    pub async fn handle_check(&self, request: &CheckConflictRequest) -> ConflictResponse {
        let result = self
            .checker()
            .check_raw(
                &request.start_time,
                &request.end_time,
                non_blank(request.venue.as_deref()),
                non_blank(request.exclude_event_id.as_deref()),
            )
            .await;
        ConflictResponse::from(&result)
    }

    pub async fn handle_create(
        &self,
        request: CreateEventRequest,
    ) -> std::result::Result<EventRecord, ErrorResponse> {
        let outcome = match request.into_draft() {
            Ok(draft) => self.create_event(draft).await,
            Err(e) => Err(e),
        };
        outcome
            .map(|event| EventRecord::from(&event))
            .map_err(|e| ErrorResponse::from(&e))
    }

    pub async fn handle_suggest(
        &self,
        request: &SuggestRequest,
    ) -> std::result::Result<Vec<SuggestionRecord>, ErrorResponse> {
        let outcome = async {
            let start = parse_instant(&request.preferred_start)?;
            let duration = slot::hours(request.duration_hours)?;
            self.suggest_alternatives(
                start,
                duration,
                non_blank(request.venue.as_deref()),
                request.max_suggestions,
            )
            .await
        }
        .await;
        outcome
            .map(|found| found.iter().map(SuggestionRecord::from).collect())
            .map_err(|e| ErrorResponse::from(&e))
    }

    pub async fn handle_cancel(
        &self,
        event_id: &str,
    ) -> std::result::Result<EventRecord, ErrorResponse> {
        self.cancel_event(&EventId::from(event_id))
            .await
            .map(|event| EventRecord::from(&event))
            .map_err(|e| ErrorResponse::from(&e))
    }
}
