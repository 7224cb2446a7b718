//! Safety gate in front of a disconnect
//!
//! The session is only dropped while the host is idle. An unsafe host is
//! re-checked on a fixed poll interval; after `max_attempts` unsafe checks
//! the break goes ahead anyway.

use crate::config::constants::{MAX_SAFETY_ATTEMPTS, SAFETY_POLL_INTERVAL};
use crate::core::{Activity, UnsafeReason};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyConfig {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_SAFETY_ATTEMPTS,
            poll_interval: SAFETY_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyState {
    pub consecutive_unsafe_checks: u32,
}

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// Host idle, go ahead
    Proceed,
    /// Still unsafe, check again after the poll interval
    Wait,
    /// Still unsafe after the last allowed check; go ahead regardless
    Forced(UnsafeReason),
}

#[derive(Debug, Clone, Default)]
pub struct SafetyGate {
    config: SafetyConfig,
    state: SafetyState,
}

impl SafetyGate {
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config,
            state: SafetyState::default(),
        }
    }

    pub fn reset(&mut self) {
        self.state = SafetyState::default();
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    /// Record one check of the host activity
    pub fn evaluate(&mut self, activity: Activity) -> SafetyVerdict {
        let Some(reason) = activity.unsafe_reason() else {
            self.reset();
            return SafetyVerdict::Proceed;
        };

        self.state.consecutive_unsafe_checks += 1;
        debug!(
            checks = self.state.consecutive_unsafe_checks,
            max = self.config.max_attempts,
            reason = reason.as_str(),
            "Unsafe to suspend"
        );

        if self.state.consecutive_unsafe_checks >= self.config.max_attempts {
            self.reset();
            SafetyVerdict::Forced(reason)
        } else {
            SafetyVerdict::Wait
        }
    }
}
