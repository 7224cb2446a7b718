//! Linear backoff for reconnect attempts
//!
//! A short fast phase with a constant delay, then a delay growing linearly
//! with the attempt index. Linear rather than exponential keeps the
//! worst-case wait of a full episode bounded and predictable.

use crate::config::constants::{
    BACKOFF_BASE_DELAY, FAST_RETRIES, FAST_RETRY_DELAY, MAX_RECONNECT_ATTEMPTS, RECONNECT_COOLDOWN,
};
use std::time::Duration;

/// Configuration for reconnect backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Attempts using `fast_delay`
    pub fast_retries: u32,
    /// Delay of the fast phase
    pub fast_delay: Duration,
    /// Step of the linear phase
    pub base_delay: Duration,
    /// Attempts per episode before cooling down
    pub max_attempts: u32,
    /// Extended wait once attempts are exhausted
    pub cooldown: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            fast_retries: FAST_RETRIES,
            fast_delay: FAST_RETRY_DELAY,
            base_delay: BACKOFF_BASE_DELAY,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
            cooldown: RECONNECT_COOLDOWN,
        }
    }
}

impl BackoffConfig {
    /// Short delays for simulations and tests
    pub fn aggressive() -> Self {
        Self {
            fast_retries: 2,
            fast_delay: Duration::from_secs(1),
            base_delay: Duration::from_secs(2),
            max_attempts: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Delay policy, keyed by attempt index
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectBackoff {
    config: BackoffConfig,
}

impl ReconnectBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Delay before attempt `n` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt < self.config.fast_retries {
            self.config.fast_delay
        } else {
            self.config
                .base_delay
                .saturating_mul(attempt - self.config.fast_retries + 1)
        }
    }

    /// No attempts left in this episode
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.config.max_attempts
    }

    /// Get the configuration
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_fast_phase() {
        let backoff = ReconnectBackoff::default();

        assert_eq!(backoff.delay(0), Duration::from_secs(5));
        assert_eq!(backoff.delay(1), Duration::from_secs(5));
        assert_eq!(backoff.delay(2), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_linear_phase() {
        let backoff = ReconnectBackoff::default();

        assert_eq!(backoff.delay(3), Duration::from_secs(30));
        assert_eq!(backoff.delay(4), Duration::from_secs(60));
        assert_eq!(backoff.delay(9), Duration::from_secs(210));
    }

    #[test]
    fn test_backoff_max_attempts() {
        let backoff = ReconnectBackoff::default();

        assert!(!backoff.is_exhausted(9));
        assert!(backoff.is_exhausted(10));
        assert!(backoff.is_exhausted(11));
    }

    #[test]
    fn test_backoff_monotonic() {
        let backoff = ReconnectBackoff::default();

        let delays: Vec<Duration> = (0..20).map(|n| backoff.delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_backoff_aggressive() {
        let backoff = ReconnectBackoff::new(BackoffConfig::aggressive());

        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(2), Duration::from_secs(2));
        assert_eq!(backoff.delay(3), Duration::from_secs(4));
        assert!(backoff.is_exhausted(5));
    }
}
