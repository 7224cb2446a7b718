//! Reconnect episode bookkeeping
//!
//! The controller never sleeps: it hands out the instant the next attempt
//! becomes due and the manager checks it on every tick.

use super::backoff::{BackoffConfig, ReconnectBackoff};
use crate::schedule::span;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attempts made in the current reconnect episode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempt_count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconnectionStats {
    /// Connect commands issued
    pub attempts: u64,
    /// Episodes that ended connected
    pub successful_reconnections: u64,
    /// Attempts that found no endpoint or could not be initiated
    pub failed_attempts: u64,
    /// Episodes that ran out of attempts
    pub cooldowns: u64,
}

pub struct ReconnectController {
    backoff: ReconnectBackoff,
    retry: RetryState,
    stats: ReconnectionStats,
}

impl ReconnectController {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            backoff: ReconnectBackoff::new(config),
            retry: RetryState::default(),
            stats: ReconnectionStats::default(),
        }
    }

    /// Start a new episode
    pub fn reset(&mut self) {
        self.retry = RetryState::default();
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    pub fn attempts(&self) -> u32 {
        self.retry.attempt_count
    }

    pub fn stats(&self) -> ReconnectionStats {
        self.stats
    }

    pub fn is_exhausted(&self) -> bool {
        self.backoff.is_exhausted(self.retry.attempt_count)
    }

    /// Delay before the next attempt
    pub fn next_delay(&self) -> Duration {
        self.backoff.delay(self.retry.attempt_count)
    }

    /// When the next attempt may run, counted from `now`
    pub fn next_attempt_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + span(self.next_delay())
    }

    pub fn cooldown(&self) -> Duration {
        self.backoff.config().cooldown
    }

    /// Record a connect command
    pub fn record_attempt(&mut self, now: DateTime<Utc>) {
        self.bump(now);
        self.stats.attempts += 1;
        debug!(attempt = self.retry.attempt_count, "Reconnect attempt issued");
    }

    /// Record an attempt that never reached the session (no endpoint, not initiated)
    pub fn record_failure(&mut self, now: DateTime<Utc>, reason: &str) {
        self.bump(now);
        self.stats.failed_attempts += 1;
        warn!(
            attempt = self.retry.attempt_count,
            reason,
            "Reconnect attempt failed"
        );
    }

    pub fn record_success(&mut self) {
        info!(
            attempts = self.retry.attempt_count,
            "Session reconnected"
        );
        self.stats.successful_reconnections += 1;
        self.reset();
    }

    pub fn record_exhausted(&mut self) {
        warn!(
            attempts = self.retry.attempt_count,
            cooldown_secs = self.cooldown().as_secs(),
            "Reconnect attempts exhausted, cooling down"
        );
        self.stats.cooldowns += 1;
    }

    fn bump(&mut self, now: DateTime<Utc>) {
        // Exhaustion is checked before every attempt, so this never passes the cap
        self.retry.attempt_count = (self.retry.attempt_count + 1).min(self.backoff.config().max_attempts);
        self.retry.last_attempt_at = Some(now);
    }
}

impl Default for ReconnectController {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
