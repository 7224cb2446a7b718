//! Fixed policy constants for the break cycle
//!
//! These are not exposed in the configuration file; the policy structs
//! (`BackoffConfig`, `SafetyConfig`, ...) default to them and tests build
//! their own values where needed.

use std::time::Duration;

// ===== CONTROL LOOP =====

/// Period of the control loop tick
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ===== SAFETY GATE =====

/// Unsafe checks tolerated before the break is forced
pub const MAX_SAFETY_ATTEMPTS: u32 = 60;

/// Delay between two safety checks
pub const SAFETY_POLL_INTERVAL: Duration = Duration::from_secs(5);

// ===== RECONNECTION =====

/// Attempts in one reconnect episode before cooling down
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Attempts using the short constant delay
pub const FAST_RETRIES: u32 = 3;

/// Delay between fast retries
pub const FAST_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Step of the linear backoff after the fast phase
pub const BACKOFF_BASE_DELAY: Duration = Duration::from_secs(30);

/// Extended sleep after attempts are exhausted
pub const RECONNECT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// How long a single connect attempt may take
pub const RECONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

// ===== DISCONNECT =====

/// Minimum spacing between two disconnect commands
pub const DISCONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

// ===== ENDPOINT SELECTION =====

/// Endpoints below this load are "empty"
pub const LOW_LOAD_THRESHOLD: u32 = 50;

/// Endpoints above this load are "overcrowded"
pub const HIGH_LOAD_THRESHOLD: u32 = 1800;

/// Preferred load band for best-by-load ranking
pub const IDEAL_LOAD_MIN: u32 = 200;
pub const IDEAL_LOAD_MAX: u32 = 800;

// ===== CONFIG BOUNDS =====

/// Accepted bounds for every minute value in the timing section
pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 600;
