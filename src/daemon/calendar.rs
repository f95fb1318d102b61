//! Date source for registrations and claims.

use time::{Date, OffsetDateTime};

pub trait Calendar: Send {
    fn today(&self) -> Date;
}

/// Current UTC date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCalendar;

impl Calendar for SystemCalendar {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Always the same day.
#[derive(Debug, Clone, Copy)]
pub struct FixedCalendar(pub Date);

impl Calendar for FixedCalendar {
    fn today(&self) -> Date {
        self.0
    }
}
