//! Testing utilities and mocks
//!
//! Provides scripted implementations of every collaborator trait and a
//! harness for driving a `BreakManager` tick by tick:
//! - `MockSession`: connection state, connect outcomes, call counters
//! - `MockDirectory`: fixed candidate list, query log
//! - `RecordingSink`: captured notices
//! - `MockActivity`: settable busy / interacting flags
//! - `Harness`: mocks plus a manual clock

pub mod helpers;
pub mod mocks;

pub use helpers::*;
pub use mocks::{ConnectBehavior, MockActivity, MockDirectory, MockSession, RecordingSink};
