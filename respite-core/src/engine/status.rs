//! Read-only view of the manager for other threads
//!
//! The manager is the single writer. Readers (status display, metrics
//! server) hold clones and load with `Acquire`; instants are stored as epoch
//! milliseconds with `i64::MIN` meaning unset, so no lock is ever taken.

use crate::core::{BreakWindow, SessionState};
use crate::schedule::{seconds_until, Clock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;

const UNSET: i64 = i64::MIN;

#[derive(Debug)]
struct StatusCell {
    state: AtomicU8,
    next_break_ms: AtomicI64,
    break_ends_ms: AtomicI64,
}

#[derive(Clone)]
pub struct BreakStatus {
    cell: Arc<StatusCell>,
    clock: Arc<dyn Clock>,
}

/// Point-in-time copy of the status, for display and `/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: SessionState,
    pub next_break_at: Option<DateTime<Utc>>,
    pub break_ends_at: Option<DateTime<Utc>>,
    pub seconds_until_break: i64,
    pub seconds_remaining_in_break: i64,
}

impl BreakStatus {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cell: Arc::new(StatusCell {
                state: AtomicU8::new(SessionState::Waiting as u8),
                next_break_ms: AtomicI64::new(UNSET),
                break_ends_ms: AtomicI64::new(UNSET),
            }),
            clock,
        }
    }

    pub(crate) fn publish(&self, state: SessionState, window: &BreakWindow) {
        self.cell
            .next_break_ms
            .store(to_millis(window.next_break_at), Ordering::Release);
        self.cell
            .break_ends_ms
            .store(to_millis(window.break_ends_at), Ordering::Release);
        self.cell.state.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn current_state(&self) -> SessionState {
        self.cell.state.load(Ordering::Acquire).into()
    }

    pub fn next_break_at(&self) -> Option<DateTime<Utc>> {
        from_millis(self.cell.next_break_ms.load(Ordering::Acquire))
    }

    pub fn break_ends_at(&self) -> Option<DateTime<Utc>> {
        from_millis(self.cell.break_ends_ms.load(Ordering::Acquire))
    }

    /// Seconds until the next break, `-1` if none is scheduled
    pub fn seconds_until_break(&self) -> i64 {
        self.next_break_at()
            .map_or(-1, |at| seconds_until(self.clock.now(), at).max(0))
    }

    /// Seconds left in the current break, `-1` if not on a break
    pub fn seconds_remaining_in_break(&self) -> i64 {
        self.break_ends_at()
            .map_or(-1, |at| seconds_until(self.clock.now(), at).max(0))
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.current_state(),
            next_break_at: self.next_break_at(),
            break_ends_at: self.break_ends_at(),
            seconds_until_break: self.seconds_until_break(),
            seconds_remaining_in_break: self.seconds_remaining_in_break(),
        }
    }
}

fn to_millis(at: Option<DateTime<Utc>>) -> i64 {
    at.map_or(UNSET, |t| t.timestamp_millis())
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms == UNSET {
        None
    } else {
        DateTime::from_timestamp_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BreakKind;
    use crate::schedule::ManualClock;
    use std::time::Duration;

    fn status() -> (BreakStatus, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (BreakStatus::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_unset_values_report_minus_one() {
        let (status, _) = status();

        assert_eq!(status.current_state(), SessionState::Waiting);
        assert_eq!(status.seconds_until_break(), -1);
        assert_eq!(status.seconds_remaining_in_break(), -1);
    }

    #[test]
    fn test_published_countdowns() {
        let (status, clock) = status();
        let now = clock.now();
        let mut window = BreakWindow {
            next_break_at: Some(now + chrono::Duration::minutes(10)),
            ..Default::default()
        };
        window.open(BreakKind::Disconnect, now + chrono::Duration::minutes(3));

        status.publish(SessionState::Disconnected, &window);
        clock.advance(Duration::from_secs(60));

        assert_eq!(status.current_state(), SessionState::Disconnected);
        assert_eq!(status.seconds_until_break(), 540);
        assert_eq!(status.seconds_remaining_in_break(), 120);
    }

    #[test]
    fn test_countdown_never_negative() {
        let (status, clock) = status();
        let window = BreakWindow {
            next_break_at: Some(clock.now()),
            ..Default::default()
        };
        status.publish(SessionState::Waiting, &window);
        clock.advance(Duration::from_secs(30));

        assert_eq!(status.seconds_until_break(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let (status, _) = status();
        let reader = status.clone();

        status.publish(SessionState::Reconnecting, &BreakWindow::default());
        assert_eq!(reader.current_state(), SessionState::Reconnecting);
        assert_eq!(reader.snapshot().state, SessionState::Reconnecting);
    }
}
