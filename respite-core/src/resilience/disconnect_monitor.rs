//! Unexpected disconnect detection
//!
//! Only meaningful while the manager is `Waiting` with a break still in the
//! future: any other drop was requested by the manager itself, and a drop
//! on a due break is left to the break path.
//!
//! Without auto-reconnect the countdown is held: the remaining time is
//! captured on the first tick of the episode and the next break is pushed
//! forward by it on every tick until the session is seen connected again.
//! The notification guard is only cleared by observing the session connected
//! (or leaving `Waiting`), so a session that never comes back keeps the
//! countdown held indefinitely.

use crate::schedule::span;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectAction {
    /// Nothing unexpected
    Idle,
    /// Start reconnecting now
    Reconnect,
    /// Keep waiting with the countdown held at `next_break_at`
    Hold {
        next_break_at: DateTime<Utc>,
        /// First tick of the episode
        notify: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DisconnectMonitor {
    notified: bool,
    frozen_remaining: Option<Duration>,
}

impl DisconnectMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.notified = false;
        self.frozen_remaining = None;
    }

    /// An episode is in progress and has been reported
    pub fn is_holding(&self) -> bool {
        self.notified
    }

    /// Evaluate one tick
    pub fn observe(
        &mut self,
        now: DateTime<Utc>,
        waiting: bool,
        connected: bool,
        next_break_at: Option<DateTime<Utc>>,
        auto_reconnect: bool,
    ) -> DisconnectAction {
        if !waiting || connected {
            self.reset();
            return DisconnectAction::Idle;
        }

        let Some(next_break_at) = next_break_at.filter(|at| *at > now) else {
            return DisconnectAction::Idle;
        };

        if auto_reconnect {
            warn!("Session dropped unexpectedly, reconnecting");
            return DisconnectAction::Reconnect;
        }

        let remaining = *self
            .frozen_remaining
            .get_or_insert_with(|| (next_break_at - now).to_std().unwrap_or_default());

        let notify = !self.notified;
        if notify {
            warn!(
                remaining_secs = remaining.as_secs(),
                "Session dropped unexpectedly, break countdown held"
            );
        }
        self.notified = true;

        DisconnectAction::Hold {
            next_break_at: now + span(remaining),
            notify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_session_is_idle() {
        let mut monitor = DisconnectMonitor::new();
        let now = Utc::now();
        let next = now + chrono::Duration::minutes(10);

        assert_eq!(monitor.observe(now, true, true, Some(next), false), DisconnectAction::Idle);
    }

    #[test]
    fn test_auto_reconnect() {
        let mut monitor = DisconnectMonitor::new();
        let now = Utc::now();
        let next = now + chrono::Duration::minutes(10);

        assert_eq!(
            monitor.observe(now, true, false, Some(next), true),
            DisconnectAction::Reconnect
        );
    }

    #[test]
    fn test_hold_notifies_once_and_freezes_countdown() {
        let mut monitor = DisconnectMonitor::new();
        let t0 = Utc::now();
        let next = t0 + chrono::Duration::minutes(10);

        let first = monitor.observe(t0, true, false, Some(next), false);
        assert_eq!(first, DisconnectAction::Hold { next_break_at: next, notify: true });

        let t1 = t0 + chrono::Duration::seconds(30);
        let second = monitor.observe(t1, true, false, Some(next), false);
        assert_eq!(
            second,
            DisconnectAction::Hold {
                next_break_at: t1 + chrono::Duration::minutes(10),
                notify: false
            }
        );
        assert!(monitor.is_holding());
    }

    #[test]
    fn test_reconnection_ends_episode() {
        let mut monitor = DisconnectMonitor::new();
        let now = Utc::now();
        let next = now + chrono::Duration::minutes(10);

        monitor.observe(now, true, false, Some(next), false);
        monitor.observe(now, true, true, Some(next), false);
        assert!(!monitor.is_holding());

        match monitor.observe(now, true, false, Some(next), false) {
            DisconnectAction::Hold { notify, .. } => assert!(notify),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_scheduled_break_is_idle() {
        let mut monitor = DisconnectMonitor::new();
        assert_eq!(
            monitor.observe(Utc::now(), true, false, None, false),
            DisconnectAction::Idle
        );
    }

    #[test]
    fn test_due_break_is_idle() {
        let mut monitor = DisconnectMonitor::new();
        let now = Utc::now();

        assert_eq!(monitor.observe(now, true, false, Some(now), false), DisconnectAction::Idle);
        let past = now - chrono::Duration::seconds(1);
        assert_eq!(monitor.observe(now, true, false, Some(past), true), DisconnectAction::Idle);
        assert!(!monitor.is_holding());
    }

    #[test]
    fn test_outside_waiting_is_idle() {
        let mut monitor = DisconnectMonitor::new();
        let now = Utc::now();
        assert_eq!(
            monitor.observe(now, false, false, Some(now), false),
            DisconnectAction::Idle
        );
    }
}
