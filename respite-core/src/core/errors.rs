//! Error types for the break manager
//!
//! Collaborators report failures as `anyhow::Error`; the manager wraps them
//! with the operation that failed so the tick boundary can log something
//! actionable. Configuration problems get their own precise type.

use thiserror::Error;

/// Failure inside a single tick
///
/// None of these are fatal: the runner logs the error and the next tick
/// retries from the current state.
#[derive(Debug, Error)]
pub enum BreakError {
    /// A `SessionClient` call failed
    #[error("session client failed during {op}: {source}")]
    Session {
        /// Operation that failed (`is_connected`, `disconnect`, `connect`)
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The endpoint directory could not be queried
    #[error("endpoint directory query failed: {0}")]
    Directory(#[source] anyhow::Error),

    /// The activity probe could not be read
    #[error("activity probe failed: {0}")]
    Activity(#[source] anyhow::Error),

    /// The credential profile could not be loaded
    #[error("profile source failed: {0}")]
    Profile(#[source] anyhow::Error),
}

impl BreakError {
    pub fn session(op: &'static str, source: anyhow::Error) -> Self {
        Self::Session { op, source }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Session { .. } => "session",
            Self::Directory(_) => "directory",
            Self::Activity(_) => "activity",
            Self::Profile(_) => "profile",
        }
    }
}

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A minute value is outside its accepted bounds
    #[error("{field} = {value} is out of range ({min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The lower bound of a range exceeds its upper bound
    #[error("{min_field} ({min}) cannot exceed {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        min: u32,
        max_field: &'static str,
        max: u32,
    },

    /// Custom schedule window has no length
    #[error("schedule window start and end are both {0}")]
    EmptyScheduleWindow(String),

    /// A schedule time could not be parsed
    #[error("invalid schedule time '{0}', expected HH:MM")]
    InvalidScheduleTime(String),

    /// A UTC offset that chrono cannot represent
    #[error("invalid utc offset: {0} minutes")]
    InvalidUtcOffset(i32),
}
