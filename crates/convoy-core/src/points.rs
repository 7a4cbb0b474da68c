//! Weekly points ledger math
//!
//! Points accumulate per player per game day across a Monday-Saturday
//! event week. A re-registration for the same day replaces that day's
//! total wholesale (the amount is a day total, not a delta). Weekly
//! averages use a fixed denominator of six: a missing day counts as
//! zero, it does not shrink the divisor.

use crate::calendar::{self, GameCalendar};
use crate::error::{Error, Result};
use crate::names;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fixed divisor for weekly averages (Mon-Sat).
pub const AVERAGE_DENOMINATOR: i64 = 6;

/// One player's recorded total for one game day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub name: String,
    pub points: i64,
}

/// Entries for one game day, in registration order.
pub type DayEntries = Vec<PointsEntry>;

/// Day stamp (`YYYYMMDD`) to entries, for one ISO week.
pub type WeekPoints = IndexMap<String, DayEntries>;

/// Outcome of applying a registration to a day bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Display name after reconciliation.
    pub name: String,
    /// The day total now on record for this identity.
    pub day_total: i64,
    /// An existing entry was replaced rather than a new one created.
    pub replaced: bool,
}

/// Insert or replace a day entry for `name`.
///
/// The incoming name is reconciled against the day's existing entries;
/// on a match the entry's total is replaced and its display name upgraded
/// to the better variant.
pub fn apply_registration(entries: &mut DayEntries, name: &str, points: i64) -> Applied {
    let name = name.trim();
    for entry in entries.iter_mut() {
        if names::same_identity(&entry.name, name) {
            entry.name = names::better_display(&entry.name, name).to_string();
            entry.points = points;
            return Applied {
                name: entry.name.clone(),
                day_total: points,
                replaced: true,
            };
        }
    }
    entries.push(PointsEntry {
        name: name.to_string(),
        points,
    });
    Applied {
        name: name.to_string(),
        day_total: points,
        replaced: false,
    }
}

/// Resolve the game day a registration targets.
///
/// An explicit `mon`..`sat` key resolves to the most recent non-future
/// occurrence of that weekday, so a Monday registration can still hit
/// the prior week's Saturday. Without a key the target is yesterday's
/// game day; when yesterday is a game Sunday the target slides back to
/// Saturday of the week that just closed.
pub fn registration_target(
    cal: &GameCalendar,
    now: DateTime<Utc>,
    day_key: Option<&str>,
) -> Result<NaiveDate> {
    let today = cal.to_game_date(now);
    let target = match day_key {
        Some(key) => {
            let offset = calendar::parse_day_abbrev(key)
                .ok_or_else(|| Error::InvalidDayKey(key.to_string()))?;
            let mut t = calendar::monday_of(today) + Duration::days(offset as i64);
            if t > today {
                t -= Duration::days(7);
            }
            t
        }
        None => {
            let mut t = today - Duration::days(1);
            if t.weekday().number_from_monday() == 7 {
                t -= Duration::days(1);
            }
            t
        }
    };
    if !calendar::is_vs_day(target) {
        return Err(Error::NotVsDay(target));
    }
    if target > today {
        return Err(Error::FutureDate(target));
    }
    Ok(target)
}

/// One player's aggregated week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerWeek {
    pub name: String,
    /// Mon-Sat sum.
    pub total: i64,
    /// Days with at least one entry.
    pub days_counted: usize,
    /// Days at or above the eligibility threshold.
    pub days_hit: usize,
}

impl PlayerWeek {
    /// Fixed-denominator weekly average.
    pub fn average(&self) -> f64 {
        self.total as f64 / AVERAGE_DENOMINATOR as f64
    }

    /// Integer-exact `average() >= threshold`.
    pub fn average_meets(&self, threshold: i64) -> bool {
        self.total >= threshold * AVERAGE_DENOMINATOR
    }
}

/// Derived view of one event week; never persisted.
#[derive(Debug, Clone)]
pub struct WeeklySummary {
    pub week: String,
    pub monday: NaiveDate,
    /// Day stamp to eligible display names, all six Mon-Sat days present.
    pub eligible_by_day: IndexMap<String, Vec<String>>,
    /// Per-player aggregates, in first-seen order.
    pub players: Vec<PlayerWeek>,
    /// Mon-Sat days carrying at least one entry.
    pub days_with_entries: usize,
}

impl WeeklySummary {
    /// Aggregate a week bucket. `any_day` may be any date inside the
    /// target ISO week.
    pub fn compute(week_days: &WeekPoints, any_day: NaiveDate, threshold: i64) -> Self {
        let monday = calendar::monday_of(any_day);
        let mut eligible_by_day = IndexMap::new();
        let mut players: Vec<PlayerWeek> = Vec::new();
        let mut days_with_entries = 0;

        for day in calendar::week_mon_sat(monday) {
            let stamp = calendar::day_stamp(day);
            let entries = week_days.get(&stamp).map(Vec::as_slice).unwrap_or(&[]);
            if !entries.is_empty() {
                days_with_entries += 1;
            }

            let eligible: Vec<String> = entries
                .iter()
                .filter(|e| e.points >= threshold)
                .map(|e| e.name.clone())
                .collect();
            eligible_by_day.insert(stamp, eligible);

            // Per-day totals per identity first; a day with duplicate
            // variants of one identity still counts as one day.
            let mut per_player: Vec<(String, i64)> = Vec::new();
            for entry in entries {
                match per_player
                    .iter_mut()
                    .find(|(n, _)| names::same_identity(n, &entry.name))
                {
                    Some((n, p)) => {
                        *n = names::better_display(n, &entry.name).to_string();
                        *p += entry.points;
                    }
                    None => per_player.push((entry.name.clone(), entry.points)),
                }
            }

            for (name, points) in per_player {
                let hit = usize::from(points >= threshold);
                match players
                    .iter_mut()
                    .find(|p| names::same_identity(&p.name, &name))
                {
                    Some(p) => {
                        p.name = names::better_display(&p.name, &name).to_string();
                        p.total += points;
                        p.days_counted += 1;
                        p.days_hit += hit;
                    }
                    None => players.push(PlayerWeek {
                        name,
                        total: points,
                        days_counted: 1,
                        days_hit: hit,
                    }),
                }
            }
        }

        Self {
            week: calendar::iso_week_key(monday),
            monday,
            eligible_by_day,
            players,
            days_with_entries,
        }
    }

    /// Eligible names for one day; empty when nobody qualified.
    pub fn eligibles_for(&self, day: NaiveDate) -> &[String] {
        self.eligible_by_day
            .get(&calendar::day_stamp(day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Players whose fixed-denominator average meets the threshold.
    pub fn average_eligibles(&self, threshold: i64) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.average_meets(threshold))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Average-eligible players sorted by weekly total, highest first.
    pub fn ranked_average_eligibles(&self, threshold: i64) -> Vec<&PlayerWeek> {
        let mut out: Vec<&PlayerWeek> = self
            .players
            .iter()
            .filter(|p| p.average_meets(threshold))
            .collect();
        out.sort_by(|a, b| b.total.cmp(&a.total));
        out
    }

    /// Every Mon-Sat day has at least one entry.
    pub fn is_complete(&self) -> bool {
        self.days_with_entries == 6
    }
}
