//! Error types for clash-engine operations.

use std::time::Duration;

use thiserror::Error;

use crate::checker::Clash;
use crate::event::EventId;

/// Everything a scheduling operation can fail with.
///
/// `Conflict` is not a fault: it is the normal "slot taken" outcome of a
/// create, carrying the primary conflicting event and the full set.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Time slot conflicts with {} existing event(s)", .0.len())]
    Conflict(Clash),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ScheduleError {
    /// A validation failure with a single message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![message.into()],
        }
    }

    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Conflict(_) => "conflict",
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(_) => "store",
            Self::Timeout(_) => "timeout",
        }
    }

    /// HTTP-equivalent status for the request layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Conflict(_) => 409,
            Self::Store(StoreError::NotFound(_)) => 404,
            Self::Store(_) => 503,
            Self::Timeout(_) => 504,
        }
    }
}

/// Failures of the durable event store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Event store unavailable: {0}")]
    Unavailable(String),

    #[error("Event store returned malformed data: {0}")]
    Malformed(String),

    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
