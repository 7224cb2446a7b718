//! Respite - session break/resume manager
//!
//! Keeps a long-running automated session on a human-like rhythm: play for a
//! randomized stretch, take a break (pausing scripts in place or dropping the
//! connection), then come back, reconnecting to a suitable endpoint with
//! backoff when needed.
//!
//! ## Architecture
//! - One `BreakManager` owns the state machine; a 1 s tick drives it
//! - All waits are deadlines in the current state, a tick never sleeps
//! - Other threads read state through the lock-free `BreakStatus`
//! - The host plugs in through the traits in `session`
//!
//! ## Core Modules
//! - `core`: `SessionState`, break window, profile, errors
//! - `config`: `BreakConfig`, loader, validation, presets
//! - `schedule`: clocks, play windows, break timing
//! - `endpoint`: candidates and reconnection target selection
//! - `resilience`: backoff, safety gate, disconnect monitor, kill switch
//! - `session`: collaborator traits
//! - `notify`: user-facing notices and sinks
//! - `engine`: `BreakManager`, `BreakStatus`, `BreakRunner`
//! - `monitoring`: Prometheus metrics and HTTP endpoint
//! - `testing`: scripted collaborators and a test harness

pub mod config;
pub mod core;
pub mod endpoint;
pub mod engine;
pub mod monitoring;
pub mod notify;
pub mod resilience;
pub mod schedule;
pub mod session;
pub mod testing;
pub mod utils;

pub use crate::config::BreakConfig;
pub use crate::core::{BreakError, BreakKind, BreakWindow, ConfigError, CredentialProfile, SessionState};
pub use engine::{BreakManager, BreakRunner, BreakStatus, Collaborators, Policies};

pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::BreakConfig;
    pub use crate::core::{Activity, BreakError, CredentialProfile, SessionState};
    pub use crate::endpoint::{EndpointCandidate, EndpointId, EndpointPreference, Region};
    pub use crate::engine::{BreakManager, BreakRunner, BreakStatus, Collaborators, Policies};
    pub use crate::resilience::KillSwitch;
    pub use crate::schedule::{Clock, SystemClock};
    pub use crate::session::{
        ActivityProbe, EndpointDirectory, NotificationSink, ProfileSource, ScriptControl,
        SessionClient,
    };
    pub use crate::{Error, Result};
}
