use super::notice::{Notice, NoticeToggle};
use crate::config::NotificationConfig;
use crate::session::NotificationSink;
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies the notification toggles, then forwards to the sink
///
/// Delivery is fire-and-forget: a failing sink is logged, never surfaced.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    config: NotificationConfig,
    target: Option<String>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, config: NotificationConfig) -> Self {
        Self {
            sink,
            config,
            target: None,
        }
    }

    /// Address notices to a profile's notification target
    pub fn set_target(&mut self, target: Option<String>) {
        self.target = target;
    }

    pub fn allows(&self, notice: &Notice) -> bool {
        if !self.config.enabled {
            return false;
        }
        match notice.toggle() {
            NoticeToggle::BreakStart => self.config.on_break_start,
            NoticeToggle::BreakEnd => self.config.on_break_end,
            NoticeToggle::ReconnectFailure => self.config.on_reconnect_failure,
            NoticeToggle::Always => true,
        }
    }

    /// Send if allowed; returns whether the sink accepted it
    pub fn notify(&self, notice: &Notice) -> bool {
        if !self.allows(notice) {
            debug!(notice = notice.name(), "Notice suppressed by configuration");
            return false;
        }

        let title = match &self.target {
            Some(target) => format!("{} [{}]", notice.title(), target),
            None => notice.title().to_string(),
        };

        match self.sink.send(&title, &notice.body()) {
            Ok(()) => {
                debug!(
                    notice = notice.name(),
                    severity = notice.severity().as_str(),
                    "Notice sent"
                );
                true
            }
            Err(e) => {
                warn!(notice = notice.name(), error = %e, "Notification delivery failed");
                false
            }
        }
    }
}
