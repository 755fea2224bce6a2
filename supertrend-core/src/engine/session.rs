//! Trading-day boundaries.
//!
//! A bar's session date is the calendar date of its timestamp in the
//! configured timezone, shifted back by `reset_hour`. With a reset hour of 18,
//! a bar at 18:05 New York time already belongs to the next session.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionClock {
    tz: Tz,
    reset_hour: u32,
}

impl SessionClock {
    pub fn new(tz: Tz, reset_hour: u32) -> Self {
        Self { tz, reset_hour }
    }

    pub fn session_date(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        let local = timestamp.with_timezone(&self.tz);
        (local - Duration::hours(i64::from(self.reset_hour))).date_naive()
    }

    /// True when `current` falls in a later session than the session date
    /// `previous`.
    pub fn is_new_session(&self, previous: NaiveDate, current: DateTime<Utc>) -> bool {
        self.session_date(current) > previous
    }
}
