//! Core types for the break/resume cycle
//!
//! This module provides the fundamental building blocks shared by every
//! component:
//! - `SessionState`: atomic-friendly state enumeration
//! - `BreakWindow`: next-break / break-end timing
//! - `CredentialProfile`: identity reused for reconnection
//! - Error types for tick failures and configuration problems

pub mod errors;
pub mod types;

// Re-export commonly used types
pub use errors::{BreakError, ConfigError};
pub use types::{
    Activity, BreakKind, BreakWindow, CredentialProfile, SessionState, UnsafeReason,
};
