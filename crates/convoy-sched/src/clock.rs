//! Injectable time source
//!
//! The firer never samples ambient time directly; it asks a [`Clock`].
//! Tests drive a [`ManualClock`] minute by minute instead of sleeping.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Source of "now" for time-driven logic.
pub trait Clock {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock; clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.now.set(self.now.get() + Duration::minutes(minutes));
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_shares_state_across_clones() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 21, 1, 0, 0).unwrap());
        let other = clock.clone();
        clock.advance_minutes(45);
        assert_eq!(
            other.now_utc(),
            Utc.with_ymd_and_hms(2025, 9, 21, 1, 45, 0).unwrap()
        );
    }
}
