//! Break cycle engine
//!
//! - `manager`: the state machine (`BreakManager`, `Phase`)
//! - `status`: lock-free read-only view for other threads
//! - `runner`: tokio tick loop with kill switch

pub mod manager;
pub mod runner;
pub mod status;

pub use manager::{BreakManager, BreakManagerBuilder, Collaborators, Phase, Policies};
pub use runner::{BreakRunner, RunnerStats};
pub use status::{BreakStatus, StatusSnapshot};
