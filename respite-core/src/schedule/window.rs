//! Recurring time-of-day windows
//!
//! The manager only asks a window three questions: is it open, how long
//! until it opens, how long until it closes. [`DailyWindow`] answers them for
//! an inclusive `start..=end` local time range, optionally limited to some
//! weekdays. Windows may wrap past midnight (`23:00..=07:00`); such an
//! occurrence belongs to the weekday it started on.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use std::time::Duration;

/// Recurring window during which the session is allowed to run
pub trait ScheduleWindow: Send + Sync {
    fn is_open(&self, now: DateTime<Utc>) -> bool;

    /// Zero when already open
    fn time_until_open(&self, now: DateTime<Utc>) -> Duration;

    /// Zero when already closed
    fn time_until_close(&self, now: DateTime<Utc>) -> Duration;

    fn describe(&self) -> String;
}

/// Daily `start..=end` window in a fixed UTC offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyWindow {
    label: String,
    start: NaiveTime,
    end: NaiveTime,
    days: Vec<Weekday>,
    offset: FixedOffset,
}

impl DailyWindow {
    pub fn new(label: impl Into<String>, start: NaiveTime, end: NaiveTime, offset: FixedOffset) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            days: Vec::new(),
            offset,
        }
    }

    /// Restrict the window to occurrences starting on these weekdays
    pub fn on_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.days = days.into_iter().collect();
        self
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    fn local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.offset).naive_local()
    }

    fn allows(&self, date: NaiveDate) -> bool {
        self.days.is_empty() || self.days.contains(&date.weekday())
    }

    fn occurrence(&self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let opens = date.and_time(self.start);
        let end_date = if self.end > self.start {
            date
        } else {
            date.checked_add_days(Days::new(1))?
        };
        Some((opens, end_date.and_time(self.end)))
    }

    /// Occurrence (opens, closes) containing `local`, if any
    fn containing(&self, local: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        [1u64, 0]
            .into_iter()
            .filter_map(|back| local.date().checked_sub_days(Days::new(back)))
            .filter(|date| self.allows(*date))
            .filter_map(|date| self.occurrence(date))
            .find(|(opens, closes)| *opens <= local && local <= *closes)
    }
}

fn to_std(span: chrono::Duration) -> Duration {
    span.to_std().unwrap_or_default()
}

impl ScheduleWindow for DailyWindow {
    fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.containing(self.local(now)).is_some()
    }

    fn time_until_open(&self, now: DateTime<Utc>) -> Duration {
        let local = self.local(now);
        if self.containing(local).is_some() {
            return Duration::ZERO;
        }

        (0u64..=7)
            .filter_map(|ahead| local.date().checked_add_days(Days::new(ahead)))
            .filter(|date| self.allows(*date))
            .map(|date| date.and_time(self.start))
            .find(|opens| *opens > local)
            .map(|opens| to_std(opens - local))
            .unwrap_or_default()
    }

    fn time_until_close(&self, now: DateTime<Utc>) -> Duration {
        let local = self.local(now);
        self.containing(local)
            .map(|(_, closes)| to_std(closes - local))
            .unwrap_or_default()
    }

    fn describe(&self) -> String {
        let mut text = format!(
            "{} ({}-{})",
            self.label,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        );
        if !self.days.is_empty() {
            let days: Vec<String> = self.days.iter().map(|d| d.to_string()).collect();
            text.push_str(&format!(" on {}", days.join(",")));
        }
        text
    }
}
