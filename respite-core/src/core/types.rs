//! Core data model for the break/resume cycle
//!
//! - `SessionState`: the fieldless state published to readers
//! - `BreakWindow`: next-break and break-end instants
//! - `CredentialProfile`: identity used for reconnection
//! - `Activity`: safety flags reported by the host

use crate::endpoint::{EndpointId, EndpointPreference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Break manager state
///
/// `#[repr(u8)]` so the current value can be published through an
/// `AtomicU8` and read by other threads without tearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SessionState {
    /// Playing, counting down to the next break
    Waiting = 0,
    /// Break due; deciding between in-place and disconnect break
    BreakRequested = 1,
    /// Waiting for the safety gate before disconnecting
    SuspendPending = 2,
    /// Disconnect issued, waiting for the session to drop
    DisconnectRequested = 3,
    /// Session down, waiting for the break to end
    Disconnected = 4,
    /// Next reconnect attempt is due (possibly after backoff)
    ReconnectRequested = 5,
    /// Connect issued, waiting for the session to come up
    Reconnecting = 6,
    /// Attempts exhausted, extended sleep before starting over
    ReconnectCooldown = 7,
    /// Break finished; timers are cleared and the next break scheduled
    BreakEnding = 8,
}

impl From<u8> for SessionState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Waiting,
            1 => Self::BreakRequested,
            2 => Self::SuspendPending,
            3 => Self::DisconnectRequested,
            4 => Self::Disconnected,
            5 => Self::ReconnectRequested,
            6 => Self::Reconnecting,
            7 => Self::ReconnectCooldown,
            8 => Self::BreakEnding,
            _ => Self::Waiting,
        }
    }
}

impl SessionState {
    pub const ALL: [SessionState; 9] = [
        Self::Waiting,
        Self::BreakRequested,
        Self::SuspendPending,
        Self::DisconnectRequested,
        Self::Disconnected,
        Self::ReconnectRequested,
        Self::Reconnecting,
        Self::ReconnectCooldown,
        Self::BreakEnding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::BreakRequested => "BREAK_REQUESTED",
            Self::SuspendPending => "SUSPEND_PENDING",
            Self::DisconnectRequested => "DISCONNECT_REQUESTED",
            Self::Disconnected => "DISCONNECTED",
            Self::ReconnectRequested => "RECONNECT_REQUESTED",
            Self::Reconnecting => "RECONNECTING",
            Self::ReconnectCooldown => "RECONNECT_COOLDOWN",
            Self::BreakEnding => "BREAK_ENDING",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a break is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakKind {
    /// Scripts are paused, the session stays connected
    InPlace,
    /// The session is disconnected for the duration of the break
    Disconnect,
}

/// Break timing
///
/// `break_ends_at` and `kind` are only set while a break is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakWindow {
    pub next_break_at: Option<DateTime<Utc>>,
    pub break_ends_at: Option<DateTime<Utc>>,
    pub kind: Option<BreakKind>,
}

impl BreakWindow {
    /// Start a break of the given kind ending at `ends_at`
    pub fn open(&mut self, kind: BreakKind, ends_at: DateTime<Utc>) {
        self.kind = Some(kind);
        self.break_ends_at = Some(ends_at);
    }

    /// Clear the active break, keeping the next-break schedule
    pub fn close(&mut self) {
        self.kind = None;
        self.break_ends_at = None;
    }

    /// A disconnect break whose window has been opened
    pub fn is_disconnect_break(&self) -> bool {
        self.break_ends_at.is_some() && self.kind == Some(BreakKind::Disconnect)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Identity used to re-establish the session
///
/// Supplied by a [`ProfileSource`](crate::session::ProfileSource) and
/// refreshed once per break cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialProfile {
    /// Account identity (display name / login)
    pub identity: String,
    /// Premium service tier (may use premium-only endpoints)
    #[serde(default)]
    pub premium: bool,
    /// Endpoint the profile prefers to reconnect to
    #[serde(default)]
    pub preferred: Option<EndpointPreference>,
    /// Where lifecycle notifications for this profile go
    #[serde(default)]
    pub notify_target: Option<String>,
}

impl CredentialProfile {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            premium: false,
            preferred: None,
            notify_target: None,
        }
    }

    pub fn premium(mut self) -> Self {
        self.premium = true;
        self
    }

    pub fn prefer(mut self, preference: EndpointPreference) -> Self {
        self.preferred = Some(preference);
        self
    }

    pub fn prefer_endpoint(self, id: EndpointId) -> Self {
        self.prefer(EndpointPreference::Specific(id))
    }
}

/// Activity flags consulted by the safety gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    /// Host reports it is busy (e.g. mid-action)
    pub busy: bool,
    /// Host reports an ongoing interaction
    pub interacting: bool,
}

impl Activity {
    pub const IDLE: Activity = Activity {
        busy: false,
        interacting: false,
    };

    pub fn is_unsafe(&self) -> bool {
        self.busy || self.interacting
    }

    /// Which flags kept the gate closed
    pub fn unsafe_reason(&self) -> Option<UnsafeReason> {
        match (self.busy, self.interacting) {
            (true, true) => Some(UnsafeReason::BusyAndInteracting),
            (true, false) => Some(UnsafeReason::Busy),
            (false, true) => Some(UnsafeReason::Interacting),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    Busy,
    Interacting,
    BusyAndInteracting,
}

impl UnsafeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::Interacting => "interacting",
            Self::BusyAndInteracting => "busy and interacting",
        }
    }
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
