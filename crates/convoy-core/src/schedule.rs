//! Recurring event schedules and occurrence computation
//!
//! An [`EventSchedule`] names a first occurrence, a server-clock time of
//! day, an optional weekend override and a repeat interval in days.
//! [`upcoming`] steps the schedule forward from "now"; when two kinds
//! would land on the exact same instant, the yielding kind is shifted
//! thirty minutes later (a deterministic tie-break, not a retry).

use crate::calendar::{self, GameCalendar};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Iteration cap for occurrence stepping; guarantees termination even on
/// a misconfigured schedule.
const MAX_STEPS: u32 = 365;

/// Minutes added to a yielding occurrence that collides with the other kind.
const OVERLAP_SHIFT_MINUTES: i64 = 30;

/// The recurring event kinds the alliance runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Mg,
    Zs,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Mg, EventKind::Zs];

    /// Short code used in store keys, log rows and fired-mark keys.
    pub fn code(&self) -> &'static str {
        match self {
            EventKind::Mg => "MG",
            EventKind::Zs => "ZS",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EventKind::Mg => "Marshall's Guard",
            EventKind::Zs => "Zombie Siege",
        }
    }

    pub fn default_repeat_days(&self) -> i64 {
        match self {
            EventKind::Mg => 2,
            EventKind::Zs => 3,
        }
    }

    /// The kind whose occurrences this kind steps aside for when both
    /// land on the exact same instant.
    pub fn yields_to(&self) -> Option<EventKind> {
        match self {
            EventKind::Mg => None,
            EventKind::Zs => Some(EventKind::Mg),
        }
    }

    pub fn from_code(code: &str) -> Option<EventKind> {
        match code.to_ascii_uppercase().as_str() {
            "MG" => Some(EventKind::Mg),
            "ZS" => Some(EventKind::Zs),
            _ => None,
        }
    }
}

/// Persistent schedule for one recurring event kind.
///
/// Owned by the store; only ever overwritten by an explicit "set
/// schedule" operation, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSchedule {
    /// First occurrence as a UTC instant.
    pub first_utc: DateTime<Utc>,
    /// Weekday time of day on the server clock, `HHMM`.
    #[serde(rename = "hhmm_server")]
    pub weekday_hhmm: String,
    /// Optional Saturday/Sunday override, `HHMM`.
    #[serde(default)]
    pub weekend_hhmm: Option<String>,
    pub repeat_days: i64,
    pub updated_at: DateTime<Utc>,
}

impl EventSchedule {
    /// Build a schedule from server-clock strings (`YYYYMMDD`, `HHMM`),
    /// validating every field.
    pub fn from_server_strings(
        cal: &GameCalendar,
        date_stamp: &str,
        weekday_hhmm: &str,
        weekend_hhmm: Option<&str>,
        repeat_days: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let date = calendar::parse_day_stamp(date_stamp)
            .ok_or_else(|| Error::InvalidFormat(date_stamp.to_string()))?;
        let time = parse_hhmm(weekday_hhmm)
            .ok_or_else(|| Error::InvalidFormat(weekday_hhmm.to_string()))?;
        if let Some(w) = weekend_hhmm {
            if parse_hhmm(w).is_none() {
                return Err(Error::InvalidFormat(w.to_string()));
            }
        }
        if repeat_days <= 0 {
            return Err(Error::InvalidFormat(format!(
                "repeat interval {repeat_days}"
            )));
        }
        Ok(Self {
            first_utc: cal.server_to_utc(date.and_time(time)),
            weekday_hhmm: normalize_hhmm(weekday_hhmm),
            weekend_hhmm: weekend_hhmm.map(normalize_hhmm),
            repeat_days,
            updated_at,
        })
    }

    /// Time-of-day string effective on `day` (weekend override when set).
    fn hhmm_for(&self, day: NaiveDate) -> &str {
        match &self.weekend_hhmm {
            Some(w) if calendar::is_weekend(day) => w,
            _ => &self.weekday_hhmm,
        }
    }
}

/// One computed future occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub instant: DateTime<Utc>,
    /// Server-calendar day the occurrence belongs to.
    pub date: NaiveDate,
    /// The weekend override supplied this occurrence's time of day.
    pub weekend_time: bool,
    /// Shifted thirty minutes to avoid an exact collision.
    pub adjusted: bool,
}

/// Parse a server `HHMM` time-of-day string; three-digit inputs are
/// zero-padded (`"930"` reads as 09:30).
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if !(3..=4).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{s:0>4}");
    let hh: u32 = padded[..2].parse().ok()?;
    let mm: u32 = padded[2..].parse().ok()?;
    NaiveTime::from_hms_opt(hh, mm, 0)
}

fn normalize_hhmm(s: &str) -> String {
    format!("{:0>4}", s.trim())
}

/// The unadjusted occurrence instant of `sched` on `day`, if the
/// schedule lands on that day at all.
pub fn occurrence_on(
    cal: &GameCalendar,
    sched: &EventSchedule,
    day: NaiveDate,
) -> Option<DateTime<Utc>> {
    if sched.repeat_days <= 0 {
        return None;
    }
    let first_day = cal.utc_to_server(sched.first_utc).date();
    let delta = (day - first_day).num_days();
    if delta < 0 || delta % sched.repeat_days != 0 {
        return None;
    }
    let time = parse_hhmm(sched.hhmm_for(day))?;
    Some(cal.server_to_utc(day.and_time(time)))
}

/// Whether `sched` has an occurrence on `day`.
pub fn occurs_on(cal: &GameCalendar, sched: &EventSchedule, day: NaiveDate) -> bool {
    occurrence_on(cal, sched, day).is_some()
}

/// Occurrence instant on `day` with the anti-overlap shift applied
/// against `avoid`. Returns the instant and whether it was shifted.
pub fn occurrence_with_avoid(
    cal: &GameCalendar,
    sched: &EventSchedule,
    avoid: Option<&EventSchedule>,
    day: NaiveDate,
) -> Option<(DateTime<Utc>, bool)> {
    let instant = occurrence_on(cal, sched, day)?;
    if let Some(other) = avoid {
        if occurrence_on(cal, other, day) == Some(instant) {
            return Some((instant + Duration::minutes(OVERLAP_SHIFT_MINUTES), true));
        }
    }
    Some((instant, false))
}

/// Compute the next `count` occurrences of `sched` at or after `now`.
///
/// When `avoid` is supplied (the schedule this kind yields to), a
/// candidate whose instant exactly equals the other kind's instant for
/// the same day is shifted [`OVERLAP_SHIFT_MINUTES`] later and tagged
/// `adjusted`. Invalid time configuration or a non-positive repeat
/// interval yields an empty list.
pub fn upcoming(
    cal: &GameCalendar,
    sched: &EventSchedule,
    avoid: Option<&EventSchedule>,
    now: DateTime<Utc>,
    count: usize,
) -> Vec<Occurrence> {
    if sched.repeat_days <= 0 {
        return Vec::new();
    }
    let first_day = cal.utc_to_server(sched.first_utc).date();
    let now_day = cal.utc_to_server(now).date();

    let mut k = if now_day <= first_day {
        0
    } else {
        (now_day - first_day).num_days() / sched.repeat_days
    };

    let mut out = Vec::new();
    let mut tried = 0;
    while out.len() < count && tried < MAX_STEPS {
        tried += 1;
        let day = first_day + Duration::days(k * sched.repeat_days);
        k += 1;

        let weekend_time = calendar::is_weekend(day) && sched.weekend_hhmm.is_some();
        let Some(time) = parse_hhmm(sched.hhmm_for(day)) else {
            // Unusable time configuration: abort generation for this kind.
            log::warn!("schedule has invalid time of day {:?}", sched.hhmm_for(day));
            return Vec::new();
        };
        let mut instant = cal.server_to_utc(day.and_time(time));

        let mut adjusted = false;
        if let Some(other) = avoid {
            if occurrence_on(cal, other, day) == Some(instant) {
                instant += Duration::minutes(OVERLAP_SHIFT_MINUTES);
                adjusted = true;
            }
        }

        if instant >= now {
            out.push(Occurrence {
                instant,
                date: day,
                weekend_time,
                adjusted,
            });
        }
    }
    out
}
