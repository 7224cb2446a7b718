//! Break/resume state machine
//!
//! `BreakManager::tick` is called once per second by the runner. Each tick:
//!
//! 1. Reads the clock and the session's connection state
//! 2. Checks for an unexpected disconnect (only while `Waiting`)
//! 3. Forces a disconnect if the session came back during a disconnect break
//! 4. Runs the handler of the current phase
//! 5. Publishes the result to `BreakStatus`
//!
//! Every wait (safety poll, backoff, attempt timeout, cooldown) is a
//! deadline carried by the `Phase` variant. A tick never sleeps.

use super::status::BreakStatus;
use crate::config::constants::{DISCONNECT_RETRY_INTERVAL, RECONNECT_ATTEMPT_TIMEOUT};
use crate::config::BreakConfig;
use crate::core::{BreakError, BreakKind, BreakWindow, CredentialProfile, SessionState};
use crate::endpoint::{EndpointId, EndpointSelector};
use crate::monitoring::MetricsRegistry;
use crate::notify::{Notice, Notifier};
use crate::resilience::{
    BackoffConfig, DisconnectAction, DisconnectMonitor, ReconnectController, ReconnectionStats,
    RetryState, SafetyConfig, SafetyGate, SafetyState, SafetyVerdict,
};
use crate::schedule::{span, BreakScheduler, Clock, ScheduleWindow, SystemClock};
use crate::session::{
    ActivityProbe, EndpointDirectory, NotificationSink, ProfileSource, ScriptControl,
    SessionClient,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Internal state, with the deadlines each state waits on
///
/// [`SessionState`] is the fieldless projection published to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    /// Break due, kind not chosen yet
    BreakRequested { schedule_driven: bool },
    /// Scripts paused, session left connected; ends on elapsed time only
    InPlaceBreak,
    SuspendPending {
        next_check_at: DateTime<Utc>,
        duration: Duration,
    },
    DisconnectRequested {
        last_command_at: Option<DateTime<Utc>>,
    },
    Disconnected,
    ReconnectRequested { not_before: DateTime<Utc> },
    Reconnecting {
        deadline: DateTime<Utc>,
        endpoint: EndpointId,
    },
    ReconnectCooldown { until: DateTime<Utc> },
    BreakEnding,
}

impl Phase {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Waiting => SessionState::Waiting,
            Self::BreakRequested { .. } | Self::InPlaceBreak => SessionState::BreakRequested,
            Self::SuspendPending { .. } => SessionState::SuspendPending,
            Self::DisconnectRequested { .. } => SessionState::DisconnectRequested,
            Self::Disconnected => SessionState::Disconnected,
            Self::ReconnectRequested { .. } => SessionState::ReconnectRequested,
            Self::Reconnecting { .. } => SessionState::Reconnecting,
            Self::ReconnectCooldown { .. } => SessionState::ReconnectCooldown,
            Self::BreakEnding => SessionState::BreakEnding,
        }
    }
}

/// Host services the manager drives
#[derive(Clone)]
pub struct Collaborators {
    pub session: Arc<dyn SessionClient>,
    pub directory: Arc<dyn EndpointDirectory>,
    pub notifications: Arc<dyn NotificationSink>,
    pub activity: Arc<dyn ActivityProbe>,
    pub scripts: Arc<dyn ScriptControl>,
    pub profiles: Arc<dyn ProfileSource>,
}

/// Retry and polling policies
///
/// Not part of `BreakConfig`: the defaults are fixed behavior, overridden
/// only by simulations and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policies {
    pub backoff: BackoffConfig,
    pub safety: SafetyConfig,
    /// How long a connect may take before the attempt is abandoned
    pub attempt_timeout: Duration,
    /// Minimum spacing of repeated disconnect commands
    pub disconnect_retry: Duration,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            backoff: BackoffConfig::default(),
            safety: SafetyConfig::default(),
            attempt_timeout: RECONNECT_ATTEMPT_TIMEOUT,
            disconnect_retry: DISCONNECT_RETRY_INTERVAL,
        }
    }
}

impl Policies {
    /// Short waits for simulations
    pub fn aggressive() -> Self {
        Self {
            backoff: BackoffConfig::aggressive(),
            safety: SafetyConfig {
                max_attempts: 10,
                poll_interval: Duration::from_secs(1),
            },
            attempt_timeout: Duration::from_secs(5),
            disconnect_retry: Duration::from_secs(1),
        }
    }
}

pub struct BreakManagerBuilder {
    config: BreakConfig,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    policies: Policies,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl BreakManagerBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policies(mut self, policies: Policies) -> Self {
        self.policies = policies;
        self
    }

    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the configuration, load the profile and schedule the first break
    pub fn build(self) -> anyhow::Result<BreakManager> {
        let Self {
            config,
            collaborators,
            clock,
            policies,
            metrics,
        } = self;

        config.validate().context("Invalid break configuration")?;

        let window = config
            .schedule
            .window()?
            .map(|w| Arc::new(w) as Arc<dyn ScheduleWindow>);
        if let Some(w) = &window {
            info!(window = %w.describe(), "Schedule mode enabled");
        }

        let scheduler = BreakScheduler::new(config.timing, window);
        let selector = EndpointSelector::new(&config.reconnect);
        let notifier = Notifier::new(
            collaborators.notifications.clone(),
            config.notifications,
        );
        let status = BreakStatus::new(clock.clone());

        let mut manager = BreakManager {
            scheduler,
            selector,
            reconnect: ReconnectController::new(policies.backoff),
            safety: SafetyGate::new(policies.safety),
            monitor: DisconnectMonitor::new(),
            notifier,
            phase: Phase::Waiting,
            window: BreakWindow::default(),
            last_endpoint: None,
            profile: None,
            status,
            metrics,
            config,
            collaborators,
            clock,
            policies,
        };

        manager.refresh_profile().context("Failed to load credential profile")?;
        let now = manager.clock.now();
        manager.window.next_break_at = manager.scheduler.next_break_at(now);
        manager.publish();

        info!(
            mode = manager.selector.mode().as_str(),
            disconnect_on_break = manager.config.behavior.disconnect_on_break,
            auto_reconnect = manager.config.reconnect.auto_reconnect,
            next_break_in_secs = manager.status.seconds_until_break(),
            "Break manager ready"
        );

        Ok(manager)
    }
}

/// Owns the break cycle and every piece of state it needs
pub struct BreakManager {
    config: BreakConfig,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    policies: Policies,

    scheduler: BreakScheduler,
    selector: EndpointSelector,
    reconnect: ReconnectController,
    safety: SafetyGate,
    monitor: DisconnectMonitor,
    notifier: Notifier,

    phase: Phase,
    window: BreakWindow,
    /// Endpoint of the session when the last break started
    last_endpoint: Option<EndpointId>,
    profile: Option<CredentialProfile>,

    status: BreakStatus,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl BreakManager {
    /// Builder using the system clock and default policies
    pub fn builder(config: BreakConfig, collaborators: Collaborators) -> BreakManagerBuilder {
        BreakManagerBuilder {
            config,
            collaborators,
            clock: Arc::new(SystemClock),
            policies: Policies::default(),
            metrics: None,
        }
    }

    /// Run one step of the cycle and return the resulting state
    ///
    /// Errors leave the machine in a consistent phase; the next tick
    /// retries from there.
    pub fn tick(&mut self) -> Result<SessionState, BreakError> {
        let now = self.clock.now();
        let result = self.step(now);
        self.publish();
        result.map(|()| self.phase.state())
    }

    /// Stop the cycle: back to `Waiting` with every timer, counter and flag
    /// cleared and scripts resumed
    pub fn shutdown(&mut self) {
        info!(state = %self.phase.state(), "Break manager shutting down");
        self.phase = Phase::Waiting;
        self.window.clear();
        self.safety.reset();
        self.reconnect.reset();
        self.monitor.reset();
        self.last_endpoint = None;
        self.collaborators.scripts.resume();
        self.publish();
    }

    pub fn state(&self) -> SessionState {
        self.phase.state()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn window(&self) -> BreakWindow {
        self.window
    }

    /// Cloneable read-only handle for other threads
    pub fn status(&self) -> BreakStatus {
        self.status.clone()
    }

    pub fn config(&self) -> &BreakConfig {
        &self.config
    }

    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    pub fn retry_state(&self) -> RetryState {
        self.reconnect.retry_state()
    }

    pub fn reconnection_stats(&self) -> ReconnectionStats {
        self.reconnect.stats()
    }

    pub fn safety_state(&self) -> SafetyState {
        self.safety.state()
    }

    pub fn last_endpoint(&self) -> Option<EndpointId> {
        self.last_endpoint
    }

    pub fn profile(&self) -> Option<&CredentialProfile> {
        self.profile.as_ref()
    }

    fn step(&mut self, now: DateTime<Utc>) -> Result<(), BreakError> {
        let connected = self
            .collaborators
            .session
            .is_connected()
            .map_err(|e| BreakError::session("is_connected", e))?;

        if let Some(metrics) = &self.metrics {
            metrics.system().session_connected.set(i64::from(connected));
        }

        if self.check_unexpected_disconnect(now, connected)? {
            return Ok(());
        }

        if connected
            && self.window.is_disconnect_break()
            && !matches!(
                self.phase,
                Phase::SuspendPending { .. } | Phase::DisconnectRequested { .. }
            )
        {
            warn!(
                state = %self.phase.state(),
                "Session connected during a disconnect break, forcing disconnect"
            );
            self.transition(Phase::DisconnectRequested {
                last_command_at: None,
            });
        }

        match self.phase {
            Phase::Waiting => self.on_waiting(now),
            Phase::BreakRequested { schedule_driven } => {
                self.on_break_requested(now, schedule_driven);
                Ok(())
            }
            Phase::InPlaceBreak => {
                self.on_in_place_break(now);
                Ok(())
            }
            Phase::SuspendPending {
                next_check_at,
                duration,
            } => self.on_suspend_pending(now, connected, next_check_at, duration),
            Phase::DisconnectRequested { last_command_at } => {
                self.on_disconnect_requested(now, connected, last_command_at)
            }
            Phase::Disconnected => {
                self.on_disconnected(now);
                Ok(())
            }
            Phase::ReconnectRequested { not_before } => {
                self.on_reconnect_requested(now, connected, not_before)
            }
            Phase::Reconnecting { deadline, endpoint } => {
                self.on_reconnecting(now, connected, deadline, endpoint);
                Ok(())
            }
            Phase::ReconnectCooldown { until } => {
                self.on_cooldown(now, until);
                Ok(())
            }
            Phase::BreakEnding => {
                self.on_break_ending(now);
                Ok(())
            }
        }
    }

    /// Returns true when the tick is consumed by disconnect handling
    fn check_unexpected_disconnect(
        &mut self,
        now: DateTime<Utc>,
        connected: bool,
    ) -> Result<bool, BreakError> {
        let waiting = self.phase == Phase::Waiting;

        // Only consult the profile when a reconnect could actually start
        let auto_reconnect = if waiting && !connected && self.config.reconnect.auto_reconnect {
            if self.profile.is_none() {
                self.refresh_profile()?;
            }
            self.profile.is_some()
        } else {
            false
        };

        let action = self.monitor.observe(
            now,
            waiting,
            connected,
            self.window.next_break_at,
            auto_reconnect,
        );

        match action {
            DisconnectAction::Idle => Ok(false),
            DisconnectAction::Reconnect => {
                if let Some(metrics) = &self.metrics {
                    metrics.reconnect().unexpected_disconnects_total.inc();
                }
                self.reconnect.reset();
                let not_before = self.reconnect.next_attempt_at(now);
                self.transition(Phase::ReconnectRequested { not_before });
                Ok(true)
            }
            DisconnectAction::Hold {
                next_break_at,
                notify,
            } => {
                self.window.next_break_at = Some(next_break_at);
                if notify {
                    if let Some(metrics) = &self.metrics {
                        metrics.reconnect().unexpected_disconnects_total.inc();
                    }
                    let remaining = (next_break_at - now).to_std().unwrap_or_default();
                    self.notify(&Notice::UnexpectedDisconnect { remaining });
                }
                Ok(true)
            }
        }
    }

    fn on_waiting(&mut self, now: DateTime<Utc>) -> Result<(), BreakError> {
        let outside = self.scheduler.is_outside_schedule(now);
        let due = self.window.next_break_at.is_some_and(|at| now > at);

        if outside || due {
            self.window.next_break_at = None;
            self.transition(Phase::BreakRequested {
                schedule_driven: outside,
            });
            // Once per cycle; a failure still lets the break go ahead
            self.refresh_profile()?;
        } else if self.window.next_break_at.is_none() {
            self.window.next_break_at = self.scheduler.next_break_at(now);
        }
        Ok(())
    }

    fn on_break_requested(&mut self, now: DateTime<Utc>, schedule_driven: bool) {
        let kind = if schedule_driven || self.config.behavior.disconnect_on_break {
            BreakKind::Disconnect
        } else {
            BreakKind::InPlace
        };
        let duration = self.scheduler.break_duration(now);

        info!(
            kind = ?kind,
            duration_secs = duration.as_secs(),
            schedule_driven,
            "Break due"
        );
        if let Some(metrics) = &self.metrics {
            let label = match kind {
                BreakKind::InPlace => "in_place",
                BreakKind::Disconnect => "disconnect",
            };
            metrics.cycle().breaks_total.with_label_values(&[label]).inc();
        }
        match kind {
            BreakKind::InPlace => {
                self.notify(&Notice::BreakStarted { kind, duration });
                self.window.open(BreakKind::InPlace, now + span(duration));
                self.collaborators.scripts.pause();
                self.transition(Phase::InPlaceBreak);
            }
            BreakKind::Disconnect => {
                if let Some(current) = self.collaborators.session.current_endpoint() {
                    self.last_endpoint = Some(current);
                }
                // Provisional; reopened from the moment the disconnect is issued
                self.window.open(BreakKind::Disconnect, now + span(duration));
                self.safety.reset();
                self.transition(Phase::SuspendPending {
                    next_check_at: now,
                    duration,
                });
            }
        }
    }

    fn on_in_place_break(&mut self, now: DateTime<Utc>) {
        match self.window.break_ends_at {
            Some(ends_at) if now < ends_at => {}
            Some(_) => {
                self.window.close();
                self.notify(&Notice::BreakEnded);
                self.transition(Phase::BreakEnding);
            }
            None => {
                warn!("In-place break without an end time, resetting cycle");
                self.reset_cycle(now);
                self.transition(Phase::Waiting);
            }
        }
    }

    fn on_suspend_pending(
        &mut self,
        now: DateTime<Utc>,
        connected: bool,
        next_check_at: DateTime<Utc>,
        duration: Duration,
    ) -> Result<(), BreakError> {
        if !connected {
            info!("Session already down, break starts now");
            self.safety.reset();
            self.start_disconnect_window(now, duration);
            self.collaborators.scripts.pause();
            self.transition(Phase::Disconnected);
            return Ok(());
        }

        if self.config.behavior.safety_check_enabled {
            if now < next_check_at {
                return Ok(());
            }

            let activity = self
                .collaborators
                .activity
                .activity()
                .map_err(BreakError::Activity)?;
            if let Some(metrics) = &self.metrics {
                metrics.cycle().safety_checks_total.inc();
            }

            match self.safety.evaluate(activity) {
                SafetyVerdict::Proceed => {}
                SafetyVerdict::Wait => {
                    self.phase = Phase::SuspendPending {
                        next_check_at: now + span(self.safety.poll_interval()),
                        duration,
                    };
                    return Ok(());
                }
                SafetyVerdict::Forced(reason) => {
                    warn!(reason = reason.as_str(), "Host still busy, forcing break");
                    if let Some(metrics) = &self.metrics {
                        metrics.cycle().safety_overrides_total.inc();
                    }
                    self.notify(&Notice::SafetyOverride(reason));
                }
            }
        }

        self.safety.reset();
        self.start_disconnect_window(now, duration);
        self.collaborators.scripts.pause();
        self.transition(Phase::DisconnectRequested {
            last_command_at: None,
        });
        Ok(())
    }

    /// The safety gate is behind us: the break counts from here
    fn start_disconnect_window(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.window.open(BreakKind::Disconnect, now + span(duration));
        self.notify(&Notice::BreakStarted {
            kind: BreakKind::Disconnect,
            duration,
        });
    }

    fn on_disconnect_requested(
        &mut self,
        now: DateTime<Utc>,
        connected: bool,
        last_command_at: Option<DateTime<Utc>>,
    ) -> Result<(), BreakError> {
        if !connected {
            self.transition(Phase::Disconnected);
            return Ok(());
        }

        let due = last_command_at.map_or(true, |at| now - at >= span(self.policies.disconnect_retry));
        if due {
            self.collaborators
                .session
                .disconnect()
                .map_err(|e| BreakError::session("disconnect", e))?;
            debug!("Disconnect issued");
            self.phase = Phase::DisconnectRequested {
                last_command_at: Some(now),
            };
        }
        Ok(())
    }

    fn on_disconnected(&mut self, now: DateTime<Utc>) {
        let Some(ends_at) = self.window.break_ends_at else {
            warn!("Disconnected without a break end time, resetting cycle");
            self.reset_cycle(now);
            self.transition(Phase::Waiting);
            return;
        };

        if now < ends_at {
            return;
        }

        self.window.close();
        if self.config.reconnect.auto_reconnect {
            self.reconnect.reset();
            let not_before = self.reconnect.next_attempt_at(now);
            self.transition(Phase::ReconnectRequested { not_before });
        } else {
            self.notify(&Notice::BreakEnded);
            self.transition(Phase::BreakEnding);
        }
    }

    fn on_reconnect_requested(
        &mut self,
        now: DateTime<Utc>,
        connected: bool,
        not_before: DateTime<Utc>,
    ) -> Result<(), BreakError> {
        if connected {
            let endpoint = self.collaborators.session.current_endpoint();
            self.reconnected(endpoint);
            return Ok(());
        }

        if self.reconnect.is_exhausted() {
            self.reconnect.record_exhausted();
            if let Some(metrics) = &self.metrics {
                metrics.reconnect().cooldowns_total.inc();
            }
            let cooldown = self.reconnect.cooldown();
            self.notify(&Notice::ReconnectFailed {
                attempts: self.reconnect.attempts(),
                cooldown,
            });
            self.transition(Phase::ReconnectCooldown {
                until: now + span(cooldown),
            });
            return Ok(());
        }

        if now < not_before {
            return Ok(());
        }

        if self.profile.is_none() {
            self.refresh_profile()?;
        }
        let Some(profile) = self.profile.clone() else {
            warn!("No credential profile, abandoning reconnect");
            self.notify(&Notice::ProfileMissing);
            self.reset_cycle(now);
            self.transition(Phase::Waiting);
            return Ok(());
        };

        let selected = self.selector.select(
            self.collaborators.directory.as_ref(),
            &profile,
            self.last_endpoint,
        );
        let endpoint = match selected {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                self.attempt_failed(now, "no_endpoint");
                return Ok(());
            }
            Err(e) => {
                self.attempt_failed(now, "directory");
                return Err(e);
            }
        };

        match self.collaborators.session.connect(&profile, endpoint) {
            Ok(true) => {
                self.reconnect.record_attempt(now);
                if let Some(metrics) = &self.metrics {
                    metrics.reconnect().attempts_total.inc();
                }
                info!(
                    endpoint = %endpoint,
                    attempt = self.reconnect.attempts(),
                    "Reconnecting"
                );
                self.transition(Phase::Reconnecting {
                    deadline: now + span(self.policies.attempt_timeout),
                    endpoint,
                });
                Ok(())
            }
            Ok(false) => {
                self.attempt_failed(now, "not_initiated");
                Ok(())
            }
            Err(e) => {
                self.attempt_failed(now, "connect_error");
                Err(BreakError::session("connect", e))
            }
        }
    }

    fn on_reconnecting(
        &mut self,
        now: DateTime<Utc>,
        connected: bool,
        deadline: DateTime<Utc>,
        endpoint: EndpointId,
    ) {
        if connected {
            let current = self.collaborators.session.current_endpoint();
            self.reconnected(current.or(Some(endpoint)));
        } else if now >= deadline {
            warn!(endpoint = %endpoint, "Reconnect attempt timed out");
            let not_before = self.reconnect.next_attempt_at(now);
            self.transition(Phase::ReconnectRequested { not_before });
        }
    }

    fn on_cooldown(&mut self, now: DateTime<Utc>, until: DateTime<Utc>) {
        if now >= until {
            info!("Reconnect cooldown over, starting a new cycle");
            self.reset_cycle(now);
            self.transition(Phase::Waiting);
        }
    }

    fn on_break_ending(&mut self, now: DateTime<Utc>) {
        self.window.close();
        self.collaborators.scripts.resume();
        self.safety.reset();
        self.window.next_break_at = self.scheduler.next_break_at(now);
        info!(
            next_break_at = ?self.window.next_break_at,
            "Break over"
        );
        self.transition(Phase::Waiting);
    }

    fn reconnected(&mut self, endpoint: Option<EndpointId>) {
        if endpoint.is_some() {
            self.last_endpoint = endpoint;
        }
        self.reconnect.record_success();
        if let Some(metrics) = &self.metrics {
            metrics.reconnect().successes_total.inc();
        }
        self.notify(&Notice::Reconnected { endpoint });
        self.transition(Phase::BreakEnding);
    }

    /// An attempt that never reached the session; wait for the next slot
    fn attempt_failed(&mut self, now: DateTime<Utc>, reason: &'static str) {
        self.reconnect.record_failure(now, reason);
        if let Some(metrics) = &self.metrics {
            metrics
                .reconnect()
                .failures_total
                .with_label_values(&[reason])
                .inc();
        }
        self.phase = Phase::ReconnectRequested {
            not_before: self.reconnect.next_attempt_at(now),
        };
    }

    fn reset_cycle(&mut self, now: DateTime<Utc>) {
        self.window.close();
        self.collaborators.scripts.resume();
        self.safety.reset();
        self.reconnect.reset();
        self.monitor.reset();
        self.window.next_break_at = self.scheduler.next_break_at(now);
    }

    fn refresh_profile(&mut self) -> Result<(), BreakError> {
        let profile = self
            .collaborators
            .profiles
            .profile()
            .map_err(BreakError::Profile)?;

        match &profile {
            Some(p) => debug!(identity = %p.identity, premium = p.premium, "Profile loaded"),
            None => debug!("No credential profile configured"),
        }

        self.notifier
            .set_target(profile.as_ref().and_then(|p| p.notify_target.clone()));
        self.profile = profile;
        Ok(())
    }

    fn transition(&mut self, to: Phase) {
        let from = self.phase.state();
        self.phase = to;
        let to = to.state();

        if from != to {
            info!(from = %from, to = %to, "State transition");
            if let Some(metrics) = &self.metrics {
                metrics
                    .cycle()
                    .transitions_total
                    .with_label_values(&[from.as_str(), to.as_str()])
                    .inc();
            }
        }
    }

    fn notify(&self, notice: &Notice) {
        if self.notifier.notify(notice) {
            if let Some(metrics) = &self.metrics {
                metrics
                    .system()
                    .notices_total
                    .with_label_values(&[notice.name()])
                    .inc();
            }
        }
    }

    fn publish(&self) {
        let state = self.phase.state();
        self.status.publish(state, &self.window);

        if let Some(metrics) = &self.metrics {
            let cycle = metrics.cycle();
            cycle.state.set(i64::from(state as u8));
            cycle.seconds_until_break.set(self.status.seconds_until_break());
            cycle
                .seconds_remaining_in_break
                .set(self.status.seconds_remaining_in_break());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[test]
    fn test_phase_projection() {
        assert_eq!(Phase::InPlaceBreak.state(), SessionState::BreakRequested);
        assert_eq!(
            Phase::BreakRequested {
                schedule_driven: false
            }
            .state(),
            SessionState::BreakRequested
        );
        assert_eq!(Phase::BreakEnding.state(), SessionState::BreakEnding);
    }

    #[test]
    fn test_new_manager_schedules_first_break() {
        let harness = Harness::new();
        let manager = harness.manager();

        assert_eq!(manager.state(), SessionState::Waiting);
        let secs = manager.status().seconds_until_break();
        assert!((45 * 60..=90 * 60).contains(&secs), "got {}", secs);
        assert!(manager.profile().is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let harness = Harness::new();
        let mut config = harness.config.clone();
        config.timing.min_break_minutes = 30;
        config.timing.max_break_minutes = 10;

        let result = BreakManager::builder(config, harness.collaborators()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_shutdown_resets_everything() {
        let harness = Harness::new();
        let mut manager = harness.manager();

        harness.clock.advance(Duration::from_secs(91 * 60));
        manager.tick().unwrap();
        manager.tick().unwrap();
        assert_eq!(manager.state(), SessionState::SuspendPending);

        manager.shutdown();

        assert_eq!(manager.state(), SessionState::Waiting);
        assert_eq!(manager.window(), BreakWindow::default());
        assert_eq!(manager.status().seconds_until_break(), -1);
        assert_eq!(manager.status().seconds_remaining_in_break(), -1);
        assert!(!harness.scripts.is_paused());
    }

    #[test]
    fn test_session_error_surfaces_as_break_error() {
        let harness = Harness::new();
        let mut manager = harness.manager();

        harness.session.fail_next_status();
        let err = manager.tick().unwrap_err();
        assert_eq!(err.kind(), "session");
        assert_eq!(manager.state(), SessionState::Waiting);
    }

    #[test]
    fn test_transitions_are_counted() {
        let harness = Harness::new();
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let mut manager = harness.builder().metrics(metrics.clone()).build().unwrap();

        harness.clock.advance(Duration::from_secs(91 * 60));
        manager.tick().unwrap();

        let count = metrics
            .cycle()
            .transitions_total
            .with_label_values(&["WAITING", "BREAK_REQUESTED"])
            .get();
        assert_eq!(count, 1);
        assert_eq!(metrics.cycle().state.get(), SessionState::BreakRequested as i64);
    }
}
