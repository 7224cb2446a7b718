//! Stop signal for the control loop
//!
//! Cloned into the Ctrl+C handler, the metrics server and the runner. The
//! runner observes it between ticks and through [`KillSwitch::stopped`].
//!
//! ```no_run
//! use respite_core::resilience::KillSwitch;
//!
//! let kill_switch = KillSwitch::new();
//! let handle = kill_switch.clone();
//! std::thread::spawn(move || handle.shutdown("operator request"));
//!
//! while !kill_switch.should_stop() {
//!     // tick...
//! #   break;
//! }
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Kill switch state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KillSwitchState {
    /// Ticking normally
    Running = 0,
    /// Ticks skipped; the manager keeps its state
    Paused = 1,
    /// Stop requested
    ShuttingDown = 2,
}

impl From<u8> for KillSwitchState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Paused,
            2 => Self::ShuttingDown,
            _ => Self::Running,
        }
    }
}

#[derive(Clone)]
pub struct KillSwitch {
    state: Arc<AtomicU8>,
    shutdown_reason: Arc<parking_lot::Mutex<Option<String>>>,
    shutdown_time: Arc<parking_lot::Mutex<Option<DateTime<Utc>>>>,
    notify: Arc<Notify>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(KillSwitchState::Running as u8)),
            shutdown_reason: Arc::new(parking_lot::Mutex::new(None)),
            shutdown_time: Arc::new(parking_lot::Mutex::new(None)),
            notify: Arc::new(Notify::new()),
        }
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.state() == KillSwitchState::ShuttingDown
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state() == KillSwitchState::Paused
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state() == KillSwitchState::Running
    }

    /// Request a stop; idempotent
    pub fn shutdown(&self, reason: &str) {
        let previous: KillSwitchState = self
            .state
            .swap(KillSwitchState::ShuttingDown as u8, Ordering::AcqRel)
            .into();
        if previous == KillSwitchState::ShuttingDown {
            return;
        }

        info!(reason, "Kill switch activated");
        *self.shutdown_reason.lock() = Some(reason.to_string());
        *self.shutdown_time.lock() = Some(Utc::now());
        self.notify.notify_waiters();
    }

    /// Skip ticks until resumed
    pub fn pause(&self) {
        if self
            .state
            .compare_exchange(
                KillSwitchState::Running as u8,
                KillSwitchState::Paused as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            warn!("Kill switch: ticking paused");
        }
    }

    pub fn resume(&self) {
        if self
            .state
            .compare_exchange(
                KillSwitchState::Paused as u8,
                KillSwitchState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            info!("Kill switch: ticking resumed");
        }
    }

    pub fn state(&self) -> KillSwitchState {
        self.state.load(Ordering::Acquire).into()
    }

    pub fn shutdown_reason(&self) -> Option<String> {
        self.shutdown_reason.lock().clone()
    }

    pub fn shutdown_time(&self) -> Option<DateTime<Utc>> {
        *self.shutdown_time.lock()
    }

    /// Resolves once a stop has been requested
    pub async fn stopped(&self) {
        let notified = self.notify.notified();
        if self.should_stop() {
            return;
        }
        notified.await;
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_kill_switch_creation() {
        let ks = KillSwitch::new();
        assert!(ks.is_running());
        assert!(!ks.should_stop());
        assert!(!ks.is_paused());
    }

    #[test]
    fn test_graceful_shutdown() {
        let ks = KillSwitch::new();

        ks.shutdown("Test shutdown");
        ks.shutdown("Second call ignored");

        assert!(ks.should_stop());
        assert_eq!(ks.state(), KillSwitchState::ShuttingDown);
        assert_eq!(ks.shutdown_reason(), Some("Test shutdown".to_string()));
        assert!(ks.shutdown_time().is_some());
    }

    #[test]
    fn test_pause_resume() {
        let ks = KillSwitch::new();

        ks.pause();
        assert!(ks.is_paused());
        assert!(!ks.should_stop());

        ks.resume();
        assert!(ks.is_running());
    }

    #[test]
    fn test_cannot_resume_from_shutdown() {
        let ks = KillSwitch::new();

        ks.shutdown("Test");
        ks.resume();

        assert!(ks.should_stop());
    }

    #[tokio::test]
    async fn test_stopped_wakes_waiter() {
        let ks = KillSwitch::new();
        let trigger = ks.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.shutdown("from task");
        });

        tokio::time::timeout(Duration::from_secs(1), ks.stopped())
            .await
            .expect("stopped() should resolve");
    }

    #[tokio::test]
    async fn test_stopped_returns_immediately_after_shutdown() {
        let ks = KillSwitch::new();
        ks.shutdown("early");
        ks.stopped().await;
    }
}
