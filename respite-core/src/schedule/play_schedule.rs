use super::window::DailyWindow;
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

/// Named daily play windows
///
/// Both bounds are whole hours and inclusive. Night presets wrap past
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaySchedule {
    ShortMorning,
    MediumMorning,
    LongMorning,
    ShortAfternoon,
    MediumAfternoon,
    LongAfternoon,
    ShortEvening,
    MediumEvening,
    LongEvening,
    ShortDay,
    MediumDay,
    LongDay,
    ShortNight,
    MediumNight,
    LongNight,
    FirstNight,
    SecondNight,
    ThirdNight,
}

impl PlaySchedule {
    pub const ALL: [PlaySchedule; 18] = [
        Self::ShortMorning,
        Self::MediumMorning,
        Self::LongMorning,
        Self::ShortAfternoon,
        Self::MediumAfternoon,
        Self::LongAfternoon,
        Self::ShortEvening,
        Self::MediumEvening,
        Self::LongEvening,
        Self::ShortDay,
        Self::MediumDay,
        Self::LongDay,
        Self::ShortNight,
        Self::MediumNight,
        Self::LongNight,
        Self::FirstNight,
        Self::SecondNight,
        Self::ThirdNight,
    ];

    /// (start hour, end hour)
    pub fn hours(&self) -> (u32, u32) {
        match self {
            Self::ShortMorning => (8, 9),
            Self::MediumMorning => (7, 10),
            Self::LongMorning => (6, 12),
            Self::ShortAfternoon => (12, 13),
            Self::MediumAfternoon => (12, 15),
            Self::LongAfternoon => (12, 18),
            Self::ShortEvening => (18, 19),
            Self::MediumEvening => (17, 20),
            Self::LongEvening => (17, 23),
            Self::ShortDay => (9, 17),
            Self::MediumDay => (8, 18),
            Self::LongDay => (6, 22),
            Self::ShortNight => (23, 7),
            Self::MediumNight => (21, 9),
            Self::LongNight => (19, 11),
            Self::FirstNight => (22, 1),
            Self::SecondNight => (1, 4),
            Self::ThirdNight => (4, 7),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortMorning => "short_morning",
            Self::MediumMorning => "medium_morning",
            Self::LongMorning => "long_morning",
            Self::ShortAfternoon => "short_afternoon",
            Self::MediumAfternoon => "medium_afternoon",
            Self::LongAfternoon => "long_afternoon",
            Self::ShortEvening => "short_evening",
            Self::MediumEvening => "medium_evening",
            Self::LongEvening => "long_evening",
            Self::ShortDay => "short_day",
            Self::MediumDay => "medium_day",
            Self::LongDay => "long_day",
            Self::ShortNight => "short_night",
            Self::MediumNight => "medium_night",
            Self::LongNight => "long_night",
            Self::FirstNight => "first_night",
            Self::SecondNight => "second_night",
            Self::ThirdNight => "third_night",
        }
    }

    pub fn window(&self, offset: FixedOffset) -> DailyWindow {
        let (start, end) = self.hours();
        DailyWindow::new(self.as_str(), hour(start), hour(end), offset)
    }
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN)
}
