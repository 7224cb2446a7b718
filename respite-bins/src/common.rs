//! Common utilities for all binaries
//!
//! Shared CLI arguments, configuration resolution and logging setup.

use anyhow::{bail, Context, Result};
use clap::Parser;
use respite_core::config::PresetName;
use respite_core::engine::{BreakStatus, RunnerStats};
use respite_core::resilience::KillSwitch;
use respite_core::{BreakConfig, BreakManager};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Common CLI arguments for all binaries
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// TOML configuration file
    #[arg(short, long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in configuration: casual, marathon, in_place
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Serve Prometheus metrics and status on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CommonArgs {
    /// Configuration from file, preset or defaults, with CLI overrides applied
    pub fn resolve_config(&self) -> Result<BreakConfig> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => BreakConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            (None, Some(name)) => match PresetName::from_str(name) {
                Some(preset) => preset.config(),
                None => bail!("Unknown preset '{}' (casual, marathon, in_place)", name),
            },
            (None, None) => BreakConfig::default(),
        };

        if let Some(level) = &self.log_level {
            config.monitoring.log_level = level.clone();
        }
        if self.json_logs {
            config.monitoring.json_logs = true;
        }
        if self.metrics_addr.is_some() {
            config.monitoring.metrics_addr = self.metrics_addr;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Initialize tracing/logging from the monitoring section
pub fn init_logging(config: &BreakConfig) -> Result<()> {
    respite_core::utils::init_from_config(&config.monitoring)
}

/// Print final statistics
pub fn print_stats(stats: &RunnerStats, manager: &BreakManager) {
    let reconnects = manager.reconnection_stats();

    tracing::info!("=== Final Statistics ===");
    tracing::info!("Ticks processed: {}", stats.ticks_processed);
    tracing::info!("Tick errors: {}", stats.tick_errors);
    tracing::info!("Ticks skipped (paused): {}", stats.ticks_skipped);
    tracing::info!("Reconnect attempts: {}", reconnects.attempts);
    tracing::info!("Successful reconnections: {}", reconnects.successful_reconnections);
    tracing::info!("Failed attempts: {}", reconnects.failed_attempts);
    tracing::info!("Cooldowns: {}", reconnects.cooldowns);

    if stats.ticks_processed > 0 {
        let error_rate = (stats.tick_errors as f64 / stats.ticks_processed as f64) * 100.0;
        tracing::info!("Tick error rate: {:.2}%", error_rate);
    }
}

/// Apply one console line; returns false once the console should close
pub fn console_command(line: &str, kill_switch: &KillSwitch, status: &BreakStatus) -> bool {
    match line.trim() {
        "p" | "pause" => kill_switch.pause(),
        "r" | "resume" => kill_switch.resume(),
        "s" | "status" => {
            let snapshot = status.snapshot();
            tracing::info!(
                state = %snapshot.state,
                seconds_until_break = snapshot.seconds_until_break,
                seconds_remaining_in_break = snapshot.seconds_remaining_in_break,
                paused = kill_switch.is_paused(),
                "Status"
            );
        }
        "q" | "quit" => kill_switch.shutdown("quit from console"),
        "" => {}
        other => tracing::warn!(command = other, "Unknown console command"),
    }
    !kill_switch.should_stop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use respite_core::schedule::SystemClock;
    use std::sync::Arc;

    #[test]
    fn test_console_pause_resume_quit() {
        let kill_switch = KillSwitch::new();
        let status = BreakStatus::new(Arc::new(SystemClock));

        assert!(console_command("pause", &kill_switch, &status));
        assert!(kill_switch.is_paused());

        assert!(console_command(" r ", &kill_switch, &status));
        assert!(!kill_switch.is_paused());

        assert!(console_command("status", &kill_switch, &status));
        assert!(console_command("dance", &kill_switch, &status));
        assert!(!kill_switch.should_stop());

        assert!(!console_command("quit", &kill_switch, &status));
        assert!(kill_switch.should_stop());
    }

    #[test]
    fn test_preset_resolution() {
        let args = CommonArgs::parse_from(["respite", "--preset", "marathon"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config, BreakConfig::marathon());
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let args = CommonArgs::parse_from(["respite", "--preset", "siesta"]);
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn test_cli_overrides_monitoring() {
        let args = CommonArgs::parse_from([
            "respite",
            "--log-level",
            "debug",
            "--json-logs",
            "--metrics-addr",
            "127.0.0.1:9999",
        ]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.monitoring.log_level, "debug");
        assert!(config.monitoring.json_logs);
        assert_eq!(config.monitoring.metrics_addr, Some("127.0.0.1:9999".parse().unwrap()));
    }
}
