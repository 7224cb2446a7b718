use crate::session::NotificationSink;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        info!(title, body, "Notification");
        Ok(())
    }
}

/// One line of a notification log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecord {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// Appends notices to a JSON-lines file
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open notification log {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl NotificationSink for FileSink {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        let record = NoticeRecord {
            timestamp: Utc::now(),
            title: title.to_string(),
            body: body.to_string(),
        };
        let json = serde_json::to_string(&record)?;
        let mut file = self.file.lock();
        writeln!(file, "{}", json)?;
        file.flush()?;
        Ok(())
    }
}

/// Delivers notices on a background thread
///
/// `send` never blocks the control loop: notices go into a bounded channel
/// and a full buffer drops the notice with an error log. Dropping the sink
/// drains the channel and joins the writer thread.
pub struct ChannelSink {
    sender: Option<Sender<(String, String)>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl ChannelSink {
    pub fn spawn(inner: Arc<dyn NotificationSink>) -> Self {
        let (sender, receiver) = bounded(256);

        let handle = thread::spawn(move || {
            Self::delivery_loop(inner, receiver);
        });

        Self {
            sender: Some(sender),
            thread_handle: Some(handle),
        }
    }

    fn delivery_loop(inner: Arc<dyn NotificationSink>, receiver: Receiver<(String, String)>) {
        for (title, body) in receiver {
            if let Err(e) = inner.send(&title, &body) {
                error!(title = %title, error = %e, "Notification delivery failed");
            }
        }
        info!("Notification delivery thread stopping");
    }
}

impl NotificationSink for ChannelSink {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .context("notification channel closed")?;
        sender
            .try_send((title.to_string(), body.to_string()))
            .map_err(|e| anyhow::anyhow!("notification dropped: {}", e))
    }
}

impl Drop for ChannelSink {
    fn drop(&mut self) {
        // Closing the channel ends the delivery loop
        let _ = self.sender.take();

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}
