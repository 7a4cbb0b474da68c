//! Train lineup resolution
//!
//! Combines the deterministic driver rotation with passengers read back
//! from the draw logs. Weekly assignments live in the previous closing
//! Sunday's log; daily assignments for Tue-Fri may also sit in the
//! current week's log. Everything resolves to plain data with `Pending`
//! gaps, never an error.

use crate::error::Result;
use chrono::{Datelike, Duration, NaiveDate};
use convoy_core::{calendar, rotation, DrawRecord};
use convoy_store::{Store, WeekLog};

/// Resolved roles for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLineup {
    pub date: NaiveDate,
    /// Rotation driver on weekdays, weekend-draw driver on Sat/Sun;
    /// `None` when unresolved.
    pub driver: Option<String>,
    /// Weekend draws carry a driver backup.
    pub driver_backup: Option<String>,
    pub passenger: Option<String>,
    pub backup: Option<String>,
}

impl DayLineup {
    /// The day can be posted: a passenger is known.
    pub fn is_ready(&self) -> bool {
        self.passenger.is_some()
    }
}

/// Resolve one day's lineup.
pub fn day_lineup(store: &Store, day: NaiveDate) -> Result<DayLineup> {
    if calendar::is_weekday(day) {
        let cfg = store.train_config();
        let driver = match cfg.anchor_monday {
            Some(anchor) => rotation::driver_for_day(&cfg.drivers, anchor, day),
            None => Some(rotation::PENDING.to_string()),
        };
        let (passenger, backup) = weekday_passenger(store, day)?;
        Ok(DayLineup {
            date: day,
            driver,
            driver_backup: None,
            passenger,
            backup,
        })
    } else {
        Ok(weekend_roles(store, day)?.unwrap_or(DayLineup {
            date: day,
            driver: None,
            driver_backup: None,
            passenger: None,
            backup: None,
        }))
    }
}

/// Resolve the full Mon-Sun lineup for the week containing `any_day`.
pub fn week_lineup(store: &Store, any_day: NaiveDate) -> Result<Vec<DayLineup>> {
    let monday = calendar::monday_of(any_day);
    (0..7)
        .map(|i| day_lineup(store, monday + Duration::days(i)))
        .collect()
}

/// Previous ISO week's log: where weekly and weekend rows for this week
/// were written.
fn previous_week_log(store: &Store, day: NaiveDate) -> WeekLog {
    store.week_log(calendar::monday_of(day) - Duration::days(1))
}

/// Passenger and first backup for a weekday.
///
/// Weekly rows win over daily rows; the previous closing Sunday's log is
/// searched first, and daily rows for Tue-Fri may also come from the
/// current week's log (a Monday daily draw is always written the Sunday
/// before).
fn weekday_passenger(
    store: &Store,
    day: NaiveDate,
) -> Result<(Option<String>, Option<String>)> {
    let prev_rows = previous_week_log(store, day).draws()?;

    for row in &prev_rows {
        if let DrawRecord::Weekly {
            target,
            passenger,
            backups,
        } = &row.record
        {
            if *target == day {
                return Ok((non_empty(passenger), backups.first().cloned()));
            }
        }
    }
    if let Some(found) = find_daily(&prev_rows, day) {
        return Ok(found);
    }
    if day.weekday().number_from_monday() > 1 {
        let this_rows = store.week_log(day).draws()?;
        if let Some(found) = find_daily(&this_rows, day) {
            return Ok(found);
        }
    }
    Ok((None, None))
}

fn find_daily(
    rows: &[convoy_store::DrawRow],
    day: NaiveDate,
) -> Option<(Option<String>, Option<String>)> {
    rows.iter().find_map(|row| match &row.record {
        DrawRecord::Daily {
            target,
            passenger,
            backups,
        } if *target == day => Some((non_empty(passenger), backups.first().cloned())),
        _ => None,
    })
}

/// Weekend row for `day`, searched in the previous week's log first and
/// the current week's log second.
fn weekend_roles(store: &Store, day: NaiveDate) -> Result<Option<DayLineup>> {
    for log in [previous_week_log(store, day), store.week_log(day)] {
        for row in log.draws()? {
            if let DrawRecord::Weekend {
                target,
                driver,
                driver_backup,
                passenger,
                passenger_backups,
            } = row.record
            {
                if target == day {
                    return Ok(Some(DayLineup {
                        date: day,
                        driver: non_empty(&driver),
                        driver_backup,
                        passenger: non_empty(&passenger),
                        backup: passenger_backups.into_iter().next(),
                    }));
                }
            }
        }
    }
    Ok(None)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
