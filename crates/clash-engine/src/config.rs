//! Scheduler configuration, loadable from TOML.
//!
//! ```toml
//! scope = "same-resource"   # or "universal"
//! timeout_ms = 5000         # 0 disables the deadline
//! max_suggestions = 3
//! offsets_hours = [1, 2, -1, 3, -2, 4, -3, 6, -6, 12, -12, 24]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checker::ResourceScope;
use crate::error::ConfigError;
use crate::suggest::DEFAULT_OFFSETS_HOURS;

/// Tunables for [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Which slot pairs are compared for overlap.
    pub scope: ResourceScope,
    /// Deadline for checks, suggestions and the check phase of creation.
    pub timeout_ms: u64,
    /// Result cap for suggestion when the caller doesn't give one.
    pub max_suggestions: usize,
    /// Probe order for alternative slots, in hours from the preferred start.
    pub offsets_hours: Vec<i64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scope: ResourceScope::SameResource,
            timeout_ms: 5_000,
            max_suggestions: 3,
            offsets_hours: DEFAULT_OFFSETS_HOURS.to_vec(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// `None` when the deadline is disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offsets_hours.is_empty() {
            return Err(ConfigError::Invalid(
                "offsets_hours must not be empty".to_string(),
            ));
        }
        if self.offsets_hours.contains(&0) {
            return Err(ConfigError::Invalid(
                "offsets_hours must not contain 0 (the preferred slot itself)".to_string(),
            ));
        }
        Ok(())
    }
}
