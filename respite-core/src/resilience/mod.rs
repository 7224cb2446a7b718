//! Recovery policies around the break cycle
//!
//! - Linear reconnect backoff and per-episode retry bookkeeping
//! - Safety gate before a disconnect
//! - Unexpected disconnect detection
//! - Kill switch and panic hook for the control loop

pub mod backoff;
pub mod disconnect_monitor;
pub mod kill_switch;
pub mod panic;
pub mod reconnect;
pub mod safety;

pub use backoff::{BackoffConfig, ReconnectBackoff};
pub use disconnect_monitor::{DisconnectAction, DisconnectMonitor};
pub use kill_switch::{KillSwitch, KillSwitchState};
pub use panic::install_panic_handler;
pub use reconnect::{ReconnectController, ReconnectionStats, RetryState};
pub use safety::{SafetyConfig, SafetyGate, SafetyState, SafetyVerdict};
