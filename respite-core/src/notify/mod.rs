//! User-facing notifications
//!
//! - `Notice`: lifecycle events and their text
//! - `Notifier`: applies the configuration toggles
//! - Sinks: log, JSON-lines file, background channel

pub mod notice;
pub mod notifier;
pub mod sinks;

pub use notice::{format_duration, Notice, NoticeSeverity, NoticeToggle};
pub use notifier::Notifier;
pub use sinks::{ChannelSink, FileSink, LogSink, NoticeRecord};
