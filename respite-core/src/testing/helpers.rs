//! Harness wiring a `BreakManager` to mocks and a manual clock
//!
//! Tests drive time explicitly: `Harness::step` advances the clock by one
//! tick interval, then ticks.

use super::mocks::{MockActivity, MockDirectory, MockSession, RecordingSink};
use crate::config::constants::TICK_INTERVAL;
use crate::config::BreakConfig;
use crate::core::{CredentialProfile, SessionState};
use crate::engine::{BreakManager, BreakManagerBuilder, Collaborators, Policies};
use crate::monitoring::MetricsRegistry;
use crate::schedule::ManualClock;
use crate::session::{PauseFlag, StaticProfile};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Monday 2024-03-04 12:00:00 UTC
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn test_profile() -> CredentialProfile {
    CredentialProfile::new("tester")
}

/// Default configuration with notifications switched on
pub fn test_config() -> BreakConfig {
    let mut config = BreakConfig::default();
    config.notifications.enabled = true;
    config
}

pub fn create_test_metrics() -> Arc<MetricsRegistry> {
    Arc::new(MetricsRegistry::new().expect("Failed to create test metrics"))
}

/// Mocks, clock and configuration for one manager
pub struct Harness {
    pub config: BreakConfig,
    pub policies: Policies,
    pub clock: ManualClock,
    pub session: Arc<MockSession>,
    pub directory: Arc<MockDirectory>,
    pub sink: Arc<RecordingSink>,
    pub activity: Arc<MockActivity>,
    pub scripts: Arc<PauseFlag>,
    pub profiles: Arc<StaticProfile>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: BreakConfig) -> Self {
        Self {
            config,
            policies: Policies::default(),
            clock: ManualClock::new(test_epoch()),
            session: Arc::new(MockSession::new()),
            directory: Arc::new(MockDirectory::new(MockDirectory::sample_pool())),
            sink: Arc::new(RecordingSink::new()),
            activity: Arc::new(MockActivity::new()),
            scripts: Arc::new(PauseFlag::new()),
            profiles: Arc::new(StaticProfile::new(Some(test_profile()))),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            session: self.session.clone(),
            directory: self.directory.clone(),
            notifications: self.sink.clone(),
            activity: self.activity.clone(),
            scripts: self.scripts.clone(),
            profiles: self.profiles.clone(),
        }
    }

    /// Builder with the harness clock and policies already set
    pub fn builder(&self) -> BreakManagerBuilder {
        BreakManager::builder(self.config.clone(), self.collaborators())
            .clock(Arc::new(self.clock.clone()))
            .policies(self.policies)
    }

    /// Panics if the harness configuration is invalid
    pub fn manager(&self) -> BreakManager {
        self.builder()
            .build()
            .expect("Failed to build manager from harness")
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Move the clock just past the scheduled break
    pub fn skip_to_break(&self, manager: &BreakManager) {
        if let Some(at) = manager.window().next_break_at {
            self.clock.set(at + chrono::Duration::seconds(1));
        }
    }

    /// Advance one tick interval and tick; panics if the tick fails
    pub fn step(&self, manager: &mut BreakManager) -> SessionState {
        self.clock.advance(TICK_INTERVAL);
        manager.tick().expect("tick failed")
    }

    /// `step` repeatedly, collecting every resulting state
    pub fn run(&self, manager: &mut BreakManager, ticks: usize) -> Vec<SessionState> {
        (0..ticks).map(|_| self.step(manager)).collect()
    }

    /// `step` until `state` is reached; `None` if it is not within `max_ticks`
    pub fn run_until(
        &self,
        manager: &mut BreakManager,
        state: SessionState,
        max_ticks: usize,
    ) -> Option<usize> {
        (1..=max_ticks).find(|_| self.step(manager) == state)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse consecutive repeats: `[A, A, B, B, A]` becomes `[A, B, A]`
pub fn distinct_states(states: &[SessionState]) -> Vec<SessionState> {
    let mut out: Vec<SessionState> = Vec::with_capacity(states.len());
    for &state in states {
        if out.last() != Some(&state) {
            out.push(state);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Clock;

    #[test]
    fn test_distinct_states() {
        use SessionState::*;
        assert_eq!(
            distinct_states(&[Waiting, Waiting, BreakRequested, Waiting]),
            vec![Waiting, BreakRequested, Waiting]
        );
        assert!(distinct_states(&[]).is_empty());
    }

    #[test]
    fn test_harness_step_advances_clock() {
        let harness = Harness::new();
        let mut manager = harness.manager();

        let before = harness.clock.now();
        harness.step(&mut manager);
        assert_eq!(harness.clock.now() - before, chrono::Duration::seconds(1));
    }
}
