//! Break timing decisions
//!
//! Two modes:
//! - randomized: the next break is `now + U(min_play, max_play)` and a
//!   break lasts `U(min_break, max_break)`
//! - scheduled: play runs while the window is open; the break is due when
//!   it closes and lasts until it reopens

use super::clock::span;
use super::window::ScheduleWindow;
use crate::config::TimingConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

pub struct BreakScheduler {
    timing: TimingConfig,
    window: Option<Arc<dyn ScheduleWindow>>,
}

impl BreakScheduler {
    pub fn new(timing: TimingConfig, window: Option<Arc<dyn ScheduleWindow>>) -> Self {
        Self { timing, window }
    }

    pub fn uses_schedule(&self) -> bool {
        self.window.is_some()
    }

    pub fn window(&self) -> Option<&Arc<dyn ScheduleWindow>> {
        self.window.as_ref()
    }

    /// Schedule mode is on and the window is currently closed
    pub fn is_outside_schedule(&self, now: DateTime<Utc>) -> bool {
        self.window.as_ref().is_some_and(|w| !w.is_open(now))
    }

    /// When the next break is due
    ///
    /// `None` in schedule mode while the window is closed: the break is
    /// triggered by the closed window itself.
    pub fn next_break_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.window {
            Some(window) if window.is_open(now) => Some(now + span(window.time_until_close(now))),
            Some(_) => None,
            None => Some(now + span(self.sample_playtime())),
        }
    }

    /// How long a break starting now lasts
    pub fn break_duration(&self, now: DateTime<Utc>) -> Duration {
        match &self.window {
            Some(window) if !window.is_open(now) => window.time_until_open(now),
            _ => self.sample_break(),
        }
    }

    pub fn sample_playtime(&self) -> Duration {
        let (min, max) = self.timing.playtime_range();
        sample(min, max)
    }

    pub fn sample_break(&self) -> Duration {
        let (min, max) = self.timing.break_range();
        sample(min, max)
    }
}

/// Uniform whole-second duration in `min..=max`
fn sample(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = (min.as_secs(), max.as_secs());
    if lo >= hi {
        return min;
    }
    Duration::from_secs(rand::thread_rng().gen_range(lo..=hi))
}
