//! Export configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```json
//! {
//!   "workers": 32,
//!   "poll_interval_ms": 5000,
//!   "notify_every": 500,
//!   "include_users": true,
//!   "command_prefix": "/lp",
//!   "default_group": "default"
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExportConfig {
    /// Width of the user export worker pool.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Progress report cadence while users are exported, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Milestone frequency for group and track progress messages.
    #[serde(default = "default_notify_every")]
    pub notify_every: usize,

    /// Whether the user section is written at all.
    #[serde(default = "default_true")]
    pub include_users: bool,

    /// Invocation prefix of every emitted command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Name of the group every subject implicitly holds.
    #[serde(default = "default_default_group")]
    pub default_group: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            notify_every: default_notify_every(),
            include_users: default_true(),
            command_prefix: default_command_prefix(),
            default_group: default_default_group(),
        }
    }
}

fn default_workers() -> usize {
    32
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_notify_every() -> usize {
    500
}

fn default_true() -> bool {
    true
}

fn default_command_prefix() -> String {
    "/lp".to_string()
}

fn default_default_group() -> String {
    "default".to_string()
}

impl ExportConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self, ExportError> {
        let config: ExportConfig =
            serde_json::from_str(text).map_err(|e| ExportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.workers == 0 {
            return Err(ExportError::Config("workers must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ExportError::Config(
                "poll_interval_ms must be at least 1".into(),
            ));
        }
        if self.notify_every == 0 {
            return Err(ExportError::Config("notify_every must be at least 1".into()));
        }
        if self.command_prefix.trim().is_empty() {
            return Err(ExportError::Config("command_prefix must not be empty".into()));
        }
        if self.default_group.trim().is_empty() {
            return Err(ExportError::Config("default_group must not be empty".into()));
        }
        if self.command_prefix.contains(char::is_whitespace) {
            return Err(ExportError::Config(
                "command_prefix must not contain whitespace".into(),
            ));
        }
        if self.default_group.contains(char::is_whitespace) {
            return Err(ExportError::Config(
                "default_group must not contain whitespace".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_notify_every(mut self, notify_every: usize) -> Self {
        self.notify_every = notify_every;
        self
    }

    pub fn with_users(mut self, include_users: bool) -> Self {
        self.include_users = include_users;
        self
    }

    pub fn with_command_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    pub fn with_default_group<S: Into<String>>(mut self, group: S) -> Self {
        self.default_group = group.into();
        self
    }
}
