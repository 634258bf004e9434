use chrono::{DateTime, Duration, Local, Timelike};

/// Length of one activity window in minutes.
pub const WINDOW_MINUTES: u32 = 5;

/// An aligned wall-clock interval `[start, start + 5min)`. This is the unit
/// of activity classification: a window is either active or it isn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window {
    start: DateTime<Local>,
}

impl Window {
    /// Returns the window containing `instant`: minutes floored to the grid,
    /// seconds and sub-seconds zeroed.
    pub fn containing(instant: DateTime<Local>) -> Self {
        let start = instant
            .with_minute(instant.minute() - instant.minute() % WINDOW_MINUTES)
            .and_then(|v| v.with_second(0))
            .and_then(|v| v.with_nanosecond(0))
            .expect("flooring minutes and seconds of a valid time stays valid");
        Self { start }
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::minutes(WINDOW_MINUTES.into()),
        }
    }

    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::minutes(WINDOW_MINUTES.into()),
        }
    }

    /// `HH:MM` of the window start in local time. This is the exact form
    /// written to day logs.
    pub fn label(&self) -> String {
        self.start.format("%H:%M").to_string()
    }

    /// Time left until this window's start. Non-positive when `from` is
    /// already past the start, in which case the caller evaluates
    /// immediately instead of sleeping.
    pub fn time_until(&self, from: DateTime<Local>) -> Duration {
        self.start - from
    }
}
