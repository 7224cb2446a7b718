use super::manager::BreakManager;
use super::status::BreakStatus;
use crate::config::constants::TICK_INTERVAL;
use crate::monitoring::MetricsRegistry;
use crate::resilience::KillSwitch;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Counters for one run of the control loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub ticks_processed: u64,
    pub tick_errors: u64,
    /// Ticks skipped while the kill switch was paused
    pub ticks_skipped: u64,
}

/// Drives a `BreakManager` on a fixed interval until the kill switch fires
pub struct BreakRunner {
    manager: BreakManager,
    kill_switch: KillSwitch,
    interval: Duration,
    metrics: Option<Arc<MetricsRegistry>>,
    stats: RunnerStats,
}

impl BreakRunner {
    pub fn new(manager: BreakManager, kill_switch: KillSwitch) -> Self {
        Self {
            manager,
            kill_switch,
            interval: TICK_INTERVAL,
            metrics: None,
            stats: RunnerStats::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn status(&self) -> BreakStatus {
        self.manager.status()
    }

    /// Tick until stopped, then shut the manager down
    ///
    /// Tick errors are logged and counted; they never end the loop.
    pub async fn run(mut self) -> (BreakManager, RunnerStats) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = self.interval.as_millis() as u64,
            state = %self.manager.state(),
            "Break runner started"
        );

        loop {
            tokio::select! {
                _ = self.kill_switch.stopped() => break,
                _ = ticker.tick() => {}
            }

            if self.kill_switch.is_paused() {
                self.stats.ticks_skipped += 1;
                continue;
            }

            self.tick_once();
        }

        self.manager.shutdown();
        info!(
            reason = ?self.kill_switch.shutdown_reason(),
            stats = ?self.stats,
            "Break runner stopped"
        );

        (self.manager, self.stats)
    }

    fn tick_once(&mut self) {
        let started = Instant::now();
        let result = self.manager.tick();
        self.stats.ticks_processed += 1;

        if let Some(metrics) = &self.metrics {
            metrics.system().ticks_total.inc();
            metrics
                .system()
                .tick_duration_us
                .observe(started.elapsed().as_micros() as f64);
        }

        if let Err(e) = result {
            self.stats.tick_errors += 1;
            error!(
                kind = e.kind(),
                state = %self.manager.state(),
                error = %e,
                "Tick failed"
            );
            if let Some(metrics) = &self.metrics {
                metrics
                    .system()
                    .tick_errors_total
                    .with_label_values(&[e.kind()])
                    .inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionState;
    use crate::testing::Harness;

    #[tokio::test(start_paused = true)]
    async fn test_runner_ticks_until_stopped() {
        let harness = Harness::new();
        let kill_switch = KillSwitch::new();
        let runner = BreakRunner::new(harness.manager(), kill_switch.clone());

        let handle = tokio::spawn(runner.run());
        tokio::time::sleep(Duration::from_millis(3500)).await;
        kill_switch.shutdown("test");

        let (manager, stats) = handle.await.unwrap();
        assert!(stats.ticks_processed >= 3);
        assert_eq!(stats.tick_errors, 0);
        assert_eq!(manager.state(), SessionState::Waiting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_errors_do_not_stop_the_loop() {
        let harness = Harness::new();
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let kill_switch = KillSwitch::new();
        let runner = BreakRunner::new(harness.manager(), kill_switch.clone())
            .with_metrics(metrics.clone());

        harness.session.fail_next_status();
        let handle = tokio::spawn(runner.run());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        kill_switch.shutdown("test");

        let (_, stats) = handle.await.unwrap();
        assert_eq!(stats.tick_errors, 1);
        assert!(stats.ticks_processed >= 2);
        assert_eq!(
            metrics
                .system()
                .tick_errors_total
                .with_label_values(&["session"])
                .get(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_runner_skips_ticks() {
        let harness = Harness::new();
        let kill_switch = KillSwitch::new();
        kill_switch.pause();
        let runner = BreakRunner::new(harness.manager(), kill_switch.clone());

        let handle = tokio::spawn(runner.run());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        kill_switch.shutdown("test");

        let (_, stats) = handle.await.unwrap();
        assert_eq!(stats.ticks_processed, 0);
        assert!(stats.ticks_skipped >= 2);
    }
}
