//! Command-facing operations
//!
//! The thin command layer (chat commands, admin tooling) calls these and
//! renders whatever plain data comes back. The firer reuses the same
//! functions for its automatic draws so manual and automatic paths
//! cannot drift apart.

use crate::error::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use convoy_core::{
    calendar, draw, rotation, schedule, DrawRecord, DrawRng, EventKind, EventSchedule,
    GameCalendar, Occurrence,
};
use convoy_store::{weeklog, Store};
use std::collections::HashSet;

/// Run a daily draw off yesterday's game day and append the record to
/// that day's week log.
pub fn run_daily_draw(
    store: &Store,
    cal: &GameCalendar,
    threshold: i64,
    now: DateTime<Utc>,
    rng: &mut DrawRng,
) -> Result<DrawRecord> {
    let base = cal.to_game_date(now) - Duration::days(1);
    let summary = store.weekly_summary(base, threshold);
    let eligibles = summary.eligibles_for(base).to_vec();
    let roster = driver_roster(store);

    let record = draw::daily(base, &eligibles, &roster, rng)?;
    store.week_log(base).append_draw(base, &record)?;
    Ok(record)
}

/// Run the weekly draw for the week that just closed.
///
/// Permitted on game Sunday, or on the following game Monday as a grace
/// window; either way the records land in the closed week's log so the
/// lineup resolver finds them in the previous-Sunday file.
pub fn run_weekly_draw(
    store: &Store,
    cal: &GameCalendar,
    threshold: i64,
    now: DateTime<Utc>,
    rng: &mut DrawRng,
) -> Result<Vec<DrawRecord>> {
    let today = cal.to_game_date(now);
    let closed_ref = match today.weekday().number_from_monday() {
        7 => today,
        1 => today - Duration::days(1),
        _ => return Err(convoy_core::Error::NotDrawDay.into()),
    };

    let summary = store.weekly_summary(closed_ref, threshold);
    let pool = summary.average_eligibles(threshold);
    let roster = driver_roster(store);
    let prev_passengers = weekly_passengers(store, closed_ref - Duration::days(7))?;

    let records = draw::weekly(today, &pool, &roster, &prev_passengers, rng)?;

    let closed_sunday = calendar::closing_sunday(closed_ref);
    let log = store.week_log(closed_ref);
    for record in &records {
        log.append_draw(closed_sunday, record)?;
    }
    Ok(records)
}

/// Assign weekend roles for the upcoming Saturday and Sunday off the
/// current week's averages.
pub fn run_weekend_roles(
    store: &Store,
    cal: &GameCalendar,
    threshold: i64,
    now: DateTime<Utc>,
    rng: &mut DrawRng,
) -> Result<Vec<DrawRecord>> {
    let today = cal.to_game_date(now);
    let summary = store.weekly_summary(today, threshold);
    let ranked: Vec<String> = summary
        .ranked_average_eligibles(threshold)
        .into_iter()
        .map(|p| p.name.clone())
        .collect();
    let assigned = next_week_assigned(store, today)?;

    let records = draw::weekend(today, &ranked, &assigned, rng)?;
    let log = store.week_log(today);
    for record in &records {
        log.append_draw(today, record)?;
    }
    Ok(records)
}

/// Remove daily draw rows targeting `target` so the draw can be rerun.
///
/// A Saturday-based draw targets the following Monday, which lives in
/// the previous week's log, so both candidate logs are rewritten.
pub fn redo_daily(store: &Store, target: NaiveDate) -> Result<usize> {
    let mut removed = store.week_log(target).remove_daily_for(target)?;
    removed += store
        .week_log(target - Duration::days(7))
        .remove_daily_for(target)?;
    Ok(removed)
}

/// Remove every weekly draw row recorded under `week_key` across all
/// logs.
pub fn redo_weekly(store: &Store, week_key: &str) -> Result<usize> {
    if calendar::parse_week_key(week_key).is_none() {
        return Err(convoy_core::Error::InvalidFormat(week_key.to_string()).into());
    }
    Ok(weeklog::remove_weekly(store.data_dir(), week_key)?)
}

/// Mon-Fri rotation preview for the week containing `any_day`.
pub fn train_preview(store: &Store, any_day: NaiveDate) -> Result<Vec<(NaiveDate, String)>> {
    let cfg = store.train_config();
    match cfg.anchor_monday {
        Some(anchor) if !cfg.drivers.is_empty() => {
            Ok(rotation::weekly_preview(&cfg.drivers, anchor, any_day))
        }
        _ => Err(convoy_core::Error::NotConfigured("train").into()),
    }
}

/// Validate and persist an event schedule from server-clock strings.
pub fn set_event_schedule(
    store: &Store,
    cal: &GameCalendar,
    kind: EventKind,
    date_stamp: &str,
    weekday_hhmm: &str,
    weekend_hhmm: Option<&str>,
    now: DateTime<Utc>,
) -> Result<EventSchedule> {
    let sched = EventSchedule::from_server_strings(
        cal,
        date_stamp,
        weekday_hhmm,
        weekend_hhmm,
        kind.default_repeat_days(),
        now,
    )?;
    store.set_schedule(kind, sched.clone())?;
    Ok(sched)
}

/// Upcoming occurrences for a kind, honoring its overlap-avoidance
/// partner. Empty when the kind was never scheduled.
pub fn upcoming_occurrences(
    store: &Store,
    cal: &GameCalendar,
    kind: EventKind,
    now: DateTime<Utc>,
    count: usize,
) -> Vec<Occurrence> {
    let Some(sched) = store.schedule(kind) else {
        return Vec::new();
    };
    let avoid = kind.yields_to().and_then(|k| store.schedule(k));
    schedule::upcoming(cal, &sched, avoid.as_ref(), now, count)
}

/// Canonical exclusion set of configured train drivers.
fn driver_roster(store: &Store) -> HashSet<String> {
    draw::canonical_set(store.train_config().drivers)
}

/// Canonical names of weekly passengers recorded in the log of the week
/// containing `any_day`.
fn weekly_passengers(store: &Store, any_day: NaiveDate) -> Result<HashSet<String>> {
    let rows = store.week_log(any_day).draws()?;
    Ok(draw::canonical_set(rows.iter().filter_map(|r| {
        matches!(r.record, DrawRecord::Weekly { .. }).then(|| r.record.passenger())
    })))
}

/// Names already holding a Mon-Fri assignment for the week after
/// `today`, read from the current closing-Sunday log.
fn next_week_assigned(store: &Store, today: NaiveDate) -> Result<HashSet<String>> {
    let mon_fri: HashSet<NaiveDate> = calendar::week_mon_fri(today + Duration::days(7))
        .into_iter()
        .collect();
    let rows = store.week_log(today).draws()?;
    let mut names = Vec::new();
    for row in &rows {
        if matches!(
            row.record,
            DrawRecord::Daily { .. } | DrawRecord::Weekly { .. }
        ) && mon_fri.contains(&row.record.target())
        {
            names.extend(row.record.names().iter().map(|s| s.to_string()));
        }
    }
    Ok(draw::canonical_set(names))
}
