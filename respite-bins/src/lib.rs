//! Binaries for the respite break manager

pub mod common;
