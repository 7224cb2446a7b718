//! Collaborators the break manager drives
//!
//! The manager owns none of the session machinery. It talks to the host
//! through these traits:
//! - `SessionClient`: connection state, disconnect, connect
//! - `EndpointDirectory`: candidate endpoints for reconnection
//! - `NotificationSink`: user-facing notices
//! - `ActivityProbe`: busy / interacting flags for the safety gate
//! - `ScriptControl`: pause and resume the automation being protected
//! - `ProfileSource`: the identity to reconnect with
//!
//! All fallible calls return `anyhow::Result`; the manager wraps failures in
//! [`BreakError`](crate::core::BreakError) with the operation that failed.

use crate::core::{Activity, CredentialProfile};
use crate::endpoint::{EndpointCandidate, EndpointId, EndpointQuery};
use anyhow::Result;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Persistent session to a remote service
pub trait SessionClient: Send + Sync {
    fn is_connected(&self) -> Result<bool>;

    /// Ask the session to drop; completion is observed via `is_connected`
    fn disconnect(&self) -> Result<()>;

    /// Start connecting to `endpoint`
    ///
    /// `Ok(false)` means the attempt could not even be initiated.
    fn connect(&self, profile: &CredentialProfile, endpoint: EndpointId) -> Result<bool>;

    /// Endpoint of the live session, if any
    fn current_endpoint(&self) -> Option<EndpointId>;
}

/// Source of reconnection candidates
pub trait EndpointDirectory: Send + Sync {
    fn query(&self, query: &EndpointQuery) -> Result<Vec<EndpointCandidate>>;
}

/// Fire-and-forget notices
pub trait NotificationSink: Send + Sync {
    fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// Host activity, polled by the safety gate
pub trait ActivityProbe: Send + Sync {
    fn activity(&self) -> Result<Activity>;
}

/// Pause/resume the automation running on the session
pub trait ScriptControl: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn is_paused(&self) -> bool;
}

/// Credential profile lookup
pub trait ProfileSource: Send + Sync {
    /// `Ok(None)` when no profile is configured
    fn profile(&self) -> Result<Option<CredentialProfile>>;
}

/// `ScriptControl` backed by a flag the host polls
#[derive(Debug, Default)]
pub struct PauseFlag {
    paused: AtomicBool,
}

impl PauseFlag {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScriptControl for PauseFlag {
    fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Profile held in memory, replaceable at runtime
#[derive(Debug, Default)]
pub struct StaticProfile {
    profile: RwLock<Option<CredentialProfile>>,
}

impl StaticProfile {
    pub fn new(profile: Option<CredentialProfile>) -> Self {
        Self {
            profile: RwLock::new(profile),
        }
    }

    pub fn replace(&self, profile: Option<CredentialProfile>) {
        *self.profile.write() = profile;
    }
}

impl ProfileSource for StaticProfile {
    fn profile(&self) -> Result<Option<CredentialProfile>> {
        Ok(self.profile.read().clone())
    }
}

/// Probe for hosts without activity reporting: always idle
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysIdle;

impl ActivityProbe for AlwaysIdle {
    fn activity(&self) -> Result<Activity> {
        Ok(Activity::IDLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_flag() {
        let flag = PauseFlag::new();
        assert!(!flag.is_paused());
        flag.pause();
        assert!(flag.is_paused());
        flag.resume();
        assert!(!flag.is_paused());
    }

    #[test]
    fn test_static_profile_replace() {
        let source = StaticProfile::new(None);
        assert!(source.profile().unwrap().is_none());

        source.replace(Some(CredentialProfile::new("alice")));
        assert_eq!(source.profile().unwrap().unwrap().identity, "alice");
    }
}
