use chrono::{Local, NaiveDate};

/// Source of "today" for everything that depends on the calendar. Lets tests
/// pin the date instead of reading the system clock.
pub trait Clock {
    /// The user's local calendar date.
    fn today(&self) -> NaiveDate;

    /// Milliseconds since the Unix epoch, used to mint food ids.
    fn timestamp_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn timestamp_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// A clock frozen at midnight UTC of a given date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn timestamp_millis(&self) -> i64 {
        self.0
            .and_hms_opt(0, 0, 0)
            .map_or(0, |dt| dt.and_utc().timestamp_millis())
    }
}
