//! Clock & local timezone

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.write() = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read()
    }
}

/// Local hour (0-23) of `instant` in `zone`
pub fn local_hour(instant: DateTime<Utc>, zone: &Tz) -> u32 {
    instant.with_timezone(zone).hour()
}

/// "2024-03-12 11:30:00 AM IST"
pub fn human_time(instant: DateTime<Utc>, zone: &Tz) -> String {
    instant
        .with_timezone(zone)
        .format("%Y-%m-%d %I:%M:%S %p %Z")
        .to_string()
}

/// Parse an IANA zone name such as "Asia/Kolkata" or "America/New_York"
pub fn parse_timezone(value: &str) -> Option<Tz> {
    value.trim().parse::<Tz>().ok()
}
