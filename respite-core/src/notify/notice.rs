use crate::core::{BreakKind, UnsafeReason};
use crate::endpoint::EndpointId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NoticeSeverity {
    Info = 0,
    Warning = 1,
}

impl NoticeSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
        }
    }
}

/// Which configuration toggle gates a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeToggle {
    BreakStart,
    BreakEnd,
    ReconnectFailure,
    /// Sent whenever notifications are enabled
    Always,
}

/// Lifecycle events worth telling the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    BreakStarted { kind: BreakKind, duration: Duration },
    BreakEnded,
    Reconnected { endpoint: Option<EndpointId> },
    ReconnectFailed { attempts: u32, cooldown: Duration },
    SafetyOverride(UnsafeReason),
    UnexpectedDisconnect { remaining: Duration },
    ProfileMissing,
}

impl Notice {
    pub fn toggle(&self) -> NoticeToggle {
        match self {
            Self::BreakStarted { .. } => NoticeToggle::BreakStart,
            Self::BreakEnded | Self::Reconnected { .. } => NoticeToggle::BreakEnd,
            Self::ReconnectFailed { .. } | Self::ProfileMissing => NoticeToggle::ReconnectFailure,
            Self::SafetyOverride(_) | Self::UnexpectedDisconnect { .. } => NoticeToggle::Always,
        }
    }

    pub fn severity(&self) -> NoticeSeverity {
        match self {
            Self::BreakStarted { .. } | Self::BreakEnded | Self::Reconnected { .. } => {
                NoticeSeverity::Info
            }
            _ => NoticeSeverity::Warning,
        }
    }

    /// Short name, used as a metrics label
    pub fn name(&self) -> &'static str {
        match self {
            Self::BreakStarted { .. } => "break_started",
            Self::BreakEnded => "break_ended",
            Self::Reconnected { .. } => "reconnected",
            Self::ReconnectFailed { .. } => "reconnect_failed",
            Self::SafetyOverride(_) => "safety_override",
            Self::UnexpectedDisconnect { .. } => "unexpected_disconnect",
            Self::ProfileMissing => "profile_missing",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BreakStarted { .. } => "Break started",
            Self::BreakEnded => "Break over",
            Self::Reconnected { .. } => "Reconnected",
            Self::ReconnectFailed { .. } => "Reconnect failed",
            Self::SafetyOverride(_) => "Break forced",
            Self::UnexpectedDisconnect { .. } => "Disconnected",
            Self::ProfileMissing => "No profile",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::BreakStarted { kind, duration } => {
                let how = match kind {
                    BreakKind::InPlace => "scripts paused",
                    BreakKind::Disconnect => "disconnecting",
                };
                format!("Taking a {} break, {}", format_duration(*duration), how)
            }
            Self::BreakEnded => "Break finished, scripts resumed".to_string(),
            Self::Reconnected { endpoint: Some(id) } => format!("Back online on {}", id),
            Self::Reconnected { endpoint: None } => "Back online".to_string(),
            Self::ReconnectFailed { attempts, cooldown } => format!(
                "Gave up after {} attempts, retrying in {}",
                attempts,
                format_duration(*cooldown)
            ),
            Self::SafetyOverride(reason) => {
                format!("Still {} after every safety check, suspending anyway", reason)
            }
            Self::UnexpectedDisconnect { remaining } => format!(
                "Session dropped; break countdown paused with {} left",
                format_duration(*remaining)
            ),
            Self::ProfileMissing => "No credential profile available, reconnect skipped".to_string(),
        }
    }
}

/// `1h 05m`, `12m 30s`, `45s`
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m", h, m)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
