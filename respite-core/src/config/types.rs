use crate::core::ConfigError;
use crate::endpoint::{RegionPreference, SelectionMode};
use crate::schedule::{DailyWindow, PlaySchedule};
use chrono::{FixedOffset, Local, NaiveTime, Offset, Weekday};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main configuration structure
///
/// Immutable once handed to the manager; every field has a default so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Randomized play and break lengths (minutes, inclusive ranges)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_min_playtime")]
    pub min_playtime_minutes: u32,

    #[serde(default = "default_max_playtime")]
    pub max_playtime_minutes: u32,

    #[serde(default = "default_min_break")]
    pub min_break_minutes: u32,

    #[serde(default = "default_max_break")]
    pub max_break_minutes: u32,
}

impl TimingConfig {
    pub fn playtime_range(&self) -> (Duration, Duration) {
        (minutes(self.min_playtime_minutes), minutes(self.max_playtime_minutes))
    }

    pub fn break_range(&self) -> (Duration, Duration) {
        (minutes(self.min_break_minutes), minutes(self.max_break_minutes))
    }
}

/// What a break does to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Disconnect for the duration of the break (otherwise pause in place)
    #[serde(default = "default_true")]
    pub disconnect_on_break: bool,

    /// Wait for the host to be idle before disconnecting
    #[serde(default = "default_true")]
    pub safety_check_enabled: bool,
}

/// Reconnection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Reconnect automatically when a break ends or the session drops
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    #[serde(default)]
    pub endpoint_selection_mode: SelectionMode,

    #[serde(default)]
    pub region_preference: RegionPreference,

    /// Skip nearly empty endpoints
    #[serde(default = "default_true")]
    pub avoid_low_load: bool,

    /// Skip overcrowded endpoints
    #[serde(default = "default_true")]
    pub avoid_high_load: bool,

    /// Free profiles never pick premium endpoints; premium profiles only pick premium ones
    #[serde(default = "default_true")]
    pub respect_service_tier: bool,
}

/// Optional daily play window
///
/// Either a named `preset` or a custom `start`/`end` (`HH:MM`, local time).
/// A custom window takes precedence when both bounds are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub use_schedule: bool,

    #[serde(default = "default_preset")]
    pub preset: PlaySchedule,

    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub end: Option<String>,

    /// Weekdays the window opens on (empty = every day)
    #[serde(default)]
    pub days: Vec<Weekday>,

    /// Offset of the local clock from UTC (defaults to the host offset)
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl ScheduleConfig {
    /// Build the configured window, or `None` when schedule mode is off
    pub fn window(&self) -> Result<Option<DailyWindow>, ConfigError> {
        if !self.use_schedule {
            return Ok(None);
        }

        let offset = self.offset()?;
        let window = match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let start_at = parse_hhmm(start)?;
                let end_at = parse_hhmm(end)?;
                if start_at == end_at {
                    return Err(ConfigError::EmptyScheduleWindow(start.clone()));
                }
                DailyWindow::new("custom", start_at, end_at, offset)
            }
            _ => self.preset.window(offset),
        };

        Ok(Some(window.on_days(self.days.iter().copied())))
    }

    fn offset(&self) -> Result<FixedOffset, ConfigError> {
        match self.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or(ConfigError::InvalidUtcOffset(minutes)),
            None => Ok(Local::now().offset().fix()),
        }
    }
}

fn parse_hhmm(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidScheduleTime(value.to_string()))
}

/// Which lifecycle events are pushed to the notification sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Master switch
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub on_break_start: bool,

    #[serde(default = "default_true")]
    pub on_break_end: bool,

    #[serde(default = "default_true")]
    pub on_reconnect_failure: bool,
}

/// Logging and metrics endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Serve Prometheus metrics on this address
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
}

// Default value functions
fn default_min_playtime() -> u32 {
    45
}

fn default_max_playtime() -> u32 {
    90
}

fn default_min_break() -> u32 {
    5
}

fn default_max_break() -> u32 {
    15
}

fn default_true() -> bool {
    true
}

fn default_preset() -> PlaySchedule {
    PlaySchedule::MediumDay
}

fn default_log_level() -> String {
    "info".to_string()
}

fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_playtime_minutes: default_min_playtime(),
            max_playtime_minutes: default_max_playtime(),
            min_break_minutes: default_min_break(),
            max_break_minutes: default_max_break(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            disconnect_on_break: true,
            safety_check_enabled: true,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            endpoint_selection_mode: SelectionMode::default(),
            region_preference: RegionPreference::default(),
            avoid_low_load: true,
            avoid_high_load: true,
            respect_service_tier: true,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            use_schedule: false,
            preset: default_preset(),
            start: None,
            end: None,
            days: Vec::new(),
            utc_offset_minutes: None,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            on_break_start: true,
            on_break_end: true,
            on_reconnect_failure: true,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_addr: None,
        }
    }
}
