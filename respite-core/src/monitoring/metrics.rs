//! Prometheus metrics for the break cycle
//!
//! - Cycle: transitions, current state, countdowns, safety gate
//! - Reconnect: attempts, failures, cooldowns, unexpected drops
//! - System: ticks, tick errors, notices, session connectivity

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tracing::info;

/// Central registry for all Prometheus metrics
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    cycle: Arc<CycleMetrics>,
    reconnect: Arc<ReconnectMetrics>,
    system: Arc<SystemMetrics>,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all metric families
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let cycle = Arc::new(CycleMetrics::new(&registry)?);
        let reconnect = Arc::new(ReconnectMetrics::new(&registry)?);
        let system = Arc::new(SystemMetrics::new(&registry)?);

        info!("Prometheus metrics registry initialized");

        Ok(Self {
            registry,
            cycle,
            reconnect,
            system,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cycle(&self) -> &CycleMetrics {
        &self.cycle
    }

    pub fn reconnect(&self) -> &ReconnectMetrics {
        &self.reconnect
    }

    pub fn system(&self) -> &SystemMetrics {
        &self.system
    }
}

/// State machine metrics
pub struct CycleMetrics {
    /// Transitions by source and target state
    pub transitions_total: IntCounterVec,
    /// Current state (`SessionState as u8`)
    pub state: IntGauge,
    /// Breaks started, by kind
    pub breaks_total: IntCounterVec,
    /// Seconds until the next break (-1 unknown)
    pub seconds_until_break: IntGauge,
    /// Seconds left in the current break (-1 not on break)
    pub seconds_remaining_in_break: IntGauge,
    /// Activity checks made by the safety gate
    pub safety_checks_total: IntCounter,
    /// Breaks forced after the safety gate gave up
    pub safety_overrides_total: IntCounter,
}

impl CycleMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let transitions_total = IntCounterVec::new(
            Opts::new("cycle_transitions_total", "State transitions").namespace("respite"),
            &["from", "to"],
        )?;
        registry.register(Box::new(transitions_total.clone()))?;

        let state = IntGauge::with_opts(
            Opts::new("cycle_state", "Current state as its numeric code").namespace("respite"),
        )?;
        registry.register(Box::new(state.clone()))?;

        let breaks_total = IntCounterVec::new(
            Opts::new("cycle_breaks_total", "Breaks started").namespace("respite"),
            &["kind"],
        )?;
        registry.register(Box::new(breaks_total.clone()))?;

        let seconds_until_break = IntGauge::new(
            "respite_cycle_seconds_until_break",
            "Seconds until the next break, -1 if unknown",
        )?;
        registry.register(Box::new(seconds_until_break.clone()))?;

        let seconds_remaining_in_break = IntGauge::new(
            "respite_cycle_seconds_remaining_in_break",
            "Seconds left in the current break, -1 if not on a break",
        )?;
        registry.register(Box::new(seconds_remaining_in_break.clone()))?;

        let safety_checks_total = IntCounter::new(
            "respite_cycle_safety_checks_total",
            "Activity checks made before disconnecting",
        )?;
        registry.register(Box::new(safety_checks_total.clone()))?;

        let safety_overrides_total = IntCounter::new(
            "respite_cycle_safety_overrides_total",
            "Breaks forced while the host was still busy",
        )?;
        registry.register(Box::new(safety_overrides_total.clone()))?;

        Ok(Self {
            transitions_total,
            state,
            breaks_total,
            seconds_until_break,
            seconds_remaining_in_break,
            safety_checks_total,
            safety_overrides_total,
        })
    }
}

/// Reconnection metrics
pub struct ReconnectMetrics {
    /// Connect commands issued
    pub attempts_total: IntCounter,
    /// Attempts that never reached the session, by reason
    pub failures_total: IntCounterVec,
    /// Reconnect episodes that ended connected
    pub successes_total: IntCounter,
    /// Episodes that exhausted their attempts
    pub cooldowns_total: IntCounter,
    /// Session drops not requested by the manager
    pub unexpected_disconnects_total: IntCounter,
}

impl ReconnectMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let attempts_total = IntCounter::new(
            "respite_reconnect_attempts_total",
            "Connect commands issued",
        )?;
        registry.register(Box::new(attempts_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new("reconnect_failures_total", "Failed reconnect attempts").namespace("respite"),
            &["reason"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let successes_total = IntCounter::new(
            "respite_reconnect_successes_total",
            "Reconnect episodes that ended connected",
        )?;
        registry.register(Box::new(successes_total.clone()))?;

        let cooldowns_total = IntCounter::new(
            "respite_reconnect_cooldowns_total",
            "Reconnect episodes that ran out of attempts",
        )?;
        registry.register(Box::new(cooldowns_total.clone()))?;

        let unexpected_disconnects_total = IntCounter::new(
            "respite_reconnect_unexpected_disconnects_total",
            "Session drops not requested by the manager",
        )?;
        registry.register(Box::new(unexpected_disconnects_total.clone()))?;

        Ok(Self {
            attempts_total,
            failures_total,
            successes_total,
            cooldowns_total,
            unexpected_disconnects_total,
        })
    }
}

/// Control loop health
pub struct SystemMetrics {
    pub ticks_total: IntCounter,
    /// Ticks that returned an error, by error kind
    pub tick_errors_total: IntCounterVec,
    /// Tick body duration (microseconds)
    pub tick_duration_us: Histogram,
    /// Notices delivered, by notice name
    pub notices_total: IntCounterVec,
    /// 1 if the session reported connected on the last tick
    pub session_connected: IntGauge,
}

impl SystemMetrics {
    fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let ticks_total = IntCounter::new("respite_system_ticks_total", "Control loop ticks")?;
        registry.register(Box::new(ticks_total.clone()))?;

        let tick_errors_total = IntCounterVec::new(
            Opts::new("system_tick_errors_total", "Ticks that failed").namespace("respite"),
            &["kind"],
        )?;
        registry.register(Box::new(tick_errors_total.clone()))?;

        let tick_duration_us = Histogram::with_opts(
            HistogramOpts::new(
                "respite_system_tick_duration_us",
                "Tick body duration in microseconds",
            )
            .buckets(vec![10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 25000.0, 100000.0]),
        )?;
        registry.register(Box::new(tick_duration_us.clone()))?;

        let notices_total = IntCounterVec::new(
            Opts::new("system_notices_total", "Notices delivered").namespace("respite"),
            &["notice"],
        )?;
        registry.register(Box::new(notices_total.clone()))?;

        let session_connected = IntGauge::new(
            "respite_system_session_connected",
            "Session connectivity (1 = connected, 0 = down)",
        )?;
        registry.register(Box::new(session_connected.clone()))?;

        Ok(Self {
            ticks_total,
            tick_errors_total,
            tick_duration_us,
            notices_total,
            session_connected,
        })
    }
}
