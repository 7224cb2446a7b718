//! Time and break scheduling
//!
//! - `Clock`: injectable wall clock (system, manual, scaled)
//! - `ScheduleWindow` / `DailyWindow`: recurring play windows
//! - `PlaySchedule`: named window presets
//! - `BreakScheduler`: next-break and break-duration decisions

pub mod clock;
pub mod play_schedule;
pub mod scheduler;
pub mod window;

pub use clock::{seconds_until, span, Clock, ManualClock, ScaledClock, SystemClock};
pub use play_schedule::PlaySchedule;
pub use scheduler::BreakScheduler;
pub use window::{DailyWindow, ScheduleWindow};
