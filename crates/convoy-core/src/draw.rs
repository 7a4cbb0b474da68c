//! Constrained-random draw engine
//!
//! Selects passengers (and weekend drivers) from eligibility pools under
//! exclusion and uniqueness rules. All functions are pure over their
//! inputs plus a caller-supplied [`DrawRng`]; rejections are typed
//! errors and mutate nothing.

use crate::calendar;
use crate::error::{Error, Result};
use crate::names;
use crate::record::DrawRecord;
use crate::rng::DrawRng;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashSet;

/// Passengers assigned by a weekly draw (next Mon-Fri).
pub const WEEKLY_ASSIGNMENTS: usize = 5;

/// Backups drawn per passenger, at most.
pub const MAX_BACKUPS: usize = 2;

/// Minimum average-eligibles required before weekend roles are assigned.
pub const WEEKEND_MIN_POOL: usize = 4;

/// Drivers are drawn from the top names by weekly average.
pub const DRIVER_POOL_SIZE: usize = 10;

/// Build a canonical-form lookup set from a name list.
pub fn canonical_set<I, S>(roster: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    roster
        .into_iter()
        .map(|n| names::canonical(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect()
}

/// Drop pool members present in `excluded` (canonical comparison) and
/// collapse same-identity duplicates, keeping the better display name.
fn filter_pool(pool: &[String], excluded: &HashSet<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in pool {
        if excluded.contains(&names::canonical(name)) {
            continue;
        }
        match out.iter_mut().find(|n| names::same_identity(n, name)) {
            Some(existing) => {
                *existing = names::better_display(existing, name).to_string();
            }
            None => out.push(name.clone()),
        }
    }
    out
}

/// Daily draw: one passenger plus up to two backups from the players who
/// hit the threshold on `base` (the game day before "today").
///
/// Never based on a game Sunday. The assignment applies to the next
/// day, or to Monday when the base is a Saturday.
pub fn daily(
    base: NaiveDate,
    eligibles: &[String],
    exclude_roster: &HashSet<String>,
    rng: &mut DrawRng,
) -> Result<DrawRecord> {
    if base.weekday().number_from_monday() == 7 {
        return Err(Error::SundayBase);
    }
    let mut pool = filter_pool(eligibles, exclude_roster);
    if pool.is_empty() {
        return Err(Error::EmptyPool);
    }
    rng.shuffle(&mut pool);

    let target = if base.weekday().number_from_monday() == 6 {
        base + Duration::days(2)
    } else {
        base + Duration::days(1)
    };

    let passenger = pool.remove(0);
    let backups: Vec<String> = pool.into_iter().take(MAX_BACKUPS).collect();
    Ok(DrawRecord::Daily {
        target,
        passenger,
        backups,
    })
}

/// Weekly draw: five distinct passengers, one per target weekday, each
/// with up to two backups, consumed from the shuffled pool without
/// replacement.
///
/// Runs on game Sunday (targets next week's Mon-Fri) or on the following
/// game Monday as a grace window (targets the current week's Mon-Fri).
/// `prev_passengers` are last week's weekly passengers, excluded from
/// this pool.
pub fn weekly(
    today: NaiveDate,
    average_eligibles: &[String],
    exclude_roster: &HashSet<String>,
    prev_passengers: &HashSet<String>,
    rng: &mut DrawRng,
) -> Result<Vec<DrawRecord>> {
    let target_monday = match today.weekday().number_from_monday() {
        7 => calendar::monday_of(today) + Duration::days(7),
        1 => calendar::monday_of(today),
        _ => return Err(Error::NotDrawDay),
    };

    let mut excluded = exclude_roster.clone();
    excluded.extend(prev_passengers.iter().cloned());
    let mut pool = filter_pool(average_eligibles, &excluded);
    if pool.len() < WEEKLY_ASSIGNMENTS {
        return Err(Error::PoolTooSmall {
            need: WEEKLY_ASSIGNMENTS,
            have: pool.len(),
        });
    }
    rng.shuffle(&mut pool);

    // Passengers come off the top so all five days get one even when the
    // pool is exactly five; whatever is left becomes backups, two per
    // day in day order.
    let mut pool = pool.into_iter();
    let passengers: Vec<String> = pool.by_ref().take(WEEKLY_ASSIGNMENTS).collect();
    let mut out = Vec::with_capacity(WEEKLY_ASSIGNMENTS);
    for (i, passenger) in passengers.into_iter().enumerate() {
        let backups: Vec<String> = pool.by_ref().take(MAX_BACKUPS).collect();
        out.push(DrawRecord::Weekly {
            target: target_monday + Duration::days(i as i64),
            passenger,
            backups,
        });
    }
    Ok(out)
}

/// Weekend roles: for the upcoming Saturday and Sunday, a driver from
/// the top names by average and a passenger with up to two backups from
/// the full average pool.
///
/// `week_assigned` holds names already given a Mon-Fri assignment for
/// the target week (excluded from passenger roles only). The driver must
/// differ from that day's passenger side, and across both weekend days
/// no name repeats in any role. `ranked_pool` must be sorted by weekly
/// average, highest first.
pub fn weekend(
    today: NaiveDate,
    ranked_pool: &[String],
    week_assigned: &HashSet<String>,
    rng: &mut DrawRng,
) -> Result<Vec<DrawRecord>> {
    if ranked_pool.len() < WEEKEND_MIN_POOL {
        return Err(Error::PoolTooSmall {
            need: WEEKEND_MIN_POOL,
            have: ranked_pool.len(),
        });
    }
    let top: Vec<String> = ranked_pool.iter().take(DRIVER_POOL_SIZE).cloned().collect();

    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(2);

    for weekday in [6u32, 7u32] {
        let mut offset = weekday as i64 - today.weekday().number_from_monday() as i64;
        if offset <= 0 {
            offset += 7;
        }
        let target = today + Duration::days(offset);

        let mut passenger_excluded = week_assigned.clone();
        passenger_excluded.extend(used.iter().cloned());
        let mut candidates = filter_pool(ranked_pool, &passenger_excluded);
        if candidates.is_empty() {
            return Err(Error::EmptyPool);
        }
        rng.shuffle(&mut candidates);
        let passenger = candidates.remove(0);
        let passenger_backups: Vec<String> =
            candidates.into_iter().take(MAX_BACKUPS).collect();
        used.insert(names::canonical(&passenger));
        used.extend(passenger_backups.iter().map(|n| names::canonical(n)));

        // Drivers may repeat a Mon-Fri assignment, but never a weekend
        // role already handed out.
        let mut driver_pool = filter_pool(&top, &used);
        if driver_pool.len() < 2 {
            return Err(Error::PoolTooSmall {
                need: 2,
                have: driver_pool.len(),
            });
        }
        rng.shuffle(&mut driver_pool);
        let driver = driver_pool.remove(0);
        let driver_backup = driver_pool.remove(0);
        used.insert(names::canonical(&driver));
        used.insert(names::canonical(&driver_backup));

        out.push(DrawRecord::Weekend {
            target,
            driver,
            driver_backup: Some(driver_backup),
            passenger,
            passenger_backups,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pool(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_daily_honors_exclusion_roster() {
        let eligibles = pool(&["A-one", "B-two", "C-three"]);
        let roster = canonical_set(["C-three"]);
        // Any seed: the roster member must never be picked in any role.
        for seed in 1..=20 {
            let mut rng = DrawRng::new(seed);
            let rec = daily(date(2025, 9, 16), &eligibles, &roster, &mut rng).unwrap();
            for name in rec.names() {
                assert_ne!(name, "C-three");
            }
        }
    }

    #[test]
    fn test_daily_rejects_sunday_base() {
        let mut rng = DrawRng::new(1);
        let err = daily(
            date(2025, 9, 21),
            &pool(&["Alice"]),
            &HashSet::new(),
            &mut rng,
        );
        assert_eq!(err, Err(Error::SundayBase));
    }

    #[test]
    fn test_daily_rejects_empty_pool() {
        let mut rng = DrawRng::new(1);
        let roster = canonical_set(["Alice"]);
        let err = daily(date(2025, 9, 16), &pool(&["Alice"]), &roster, &mut rng);
        assert_eq!(err, Err(Error::EmptyPool));
    }

    #[test]
    fn test_daily_saturday_base_targets_monday() {
        let mut rng = DrawRng::new(1);
        let rec = daily(
            date(2025, 9, 20),
            &pool(&["Alice", "Bob"]),
            &HashSet::new(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(rec.target(), date(2025, 9, 22));
    }

    #[test]
    fn test_daily_weekday_base_targets_next_day() {
        let mut rng = DrawRng::new(1);
        let rec = daily(
            date(2025, 9, 16),
            &pool(&["Alice", "Bob", "Carol", "Dan"]),
            &HashSet::new(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(rec.target(), date(2025, 9, 17));
        match rec {
            DrawRecord::Daily { backups, .. } => assert_eq!(backups.len(), 2),
            _ => panic!("expected daily record"),
        }
    }

    #[test]
    fn test_weekly_only_sunday_or_monday() {
        let mut rng = DrawRng::new(1);
        let p = pool(&["A-name", "B-name", "C-name", "D-name", "E-name"]);
        let err = weekly(
            date(2025, 9, 16),
            &p,
            &HashSet::new(),
            &HashSet::new(),
            &mut rng,
        );
        assert_eq!(err, Err(Error::NotDrawDay));
    }

    #[test]
    fn test_weekly_pool_must_cover_five_days() {
        let mut rng = DrawRng::new(1);
        let err = weekly(
            date(2025, 9, 21),
            &pool(&["A-name", "B-name", "C-name", "D-name"]),
            &HashSet::new(),
            &HashSet::new(),
            &mut rng,
        );
        assert_eq!(
            err,
            Err(Error::PoolTooSmall { need: 5, have: 4 })
        );
    }

    #[test]
    fn test_weekly_sunday_targets_next_week() {
        let mut rng = DrawRng::new(3);
        let p = pool(&[
            "A-name", "B-name", "C-name", "D-name", "E-name", "F-name", "G-name",
        ]);
        let recs = weekly(
            date(2025, 9, 21),
            &p,
            &HashSet::new(),
            &HashSet::new(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0].target(), date(2025, 9, 22));
        assert_eq!(recs[4].target(), date(2025, 9, 26));

        // Without replacement: no name appears twice across all roles.
        let mut seen = HashSet::new();
        for rec in &recs {
            for name in rec.names() {
                assert!(seen.insert(name.to_string()), "{name} repeated");
            }
        }
    }

    #[test]
    fn test_weekly_monday_grace_targets_current_week() {
        let mut rng = DrawRng::new(3);
        let p = pool(&["A-name", "B-name", "C-name", "D-name", "E-name"]);
        let recs = weekly(
            date(2025, 9, 22),
            &p,
            &HashSet::new(),
            &HashSet::new(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(recs[0].target(), date(2025, 9, 22));
        assert_eq!(recs[4].target(), date(2025, 9, 26));
    }

    #[test]
    fn test_weekly_minimum_pool_still_fills_every_day() {
        let mut rng = DrawRng::new(9);
        let p = pool(&["A-name", "B-name", "C-name", "D-name", "E-name"]);
        let recs = weekly(
            date(2025, 9, 21),
            &p,
            &HashSet::new(),
            &HashSet::new(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(recs.len(), 5);
        for rec in &recs {
            match rec {
                DrawRecord::Weekly { backups, .. } => assert!(backups.is_empty()),
                _ => panic!("expected weekly record"),
            }
        }
    }

    #[test]
    fn test_weekly_excludes_previous_week_passengers() {
        let p = pool(&["A-name", "B-name", "C-name", "D-name", "E-name", "F-name"]);
        let prev = canonical_set(["F-name"]);
        for seed in 1..=20 {
            let mut rng = DrawRng::new(seed);
            let recs = weekly(date(2025, 9, 21), &p, &HashSet::new(), &prev, &mut rng).unwrap();
            for rec in &recs {
                assert_ne!(rec.passenger(), "F-name");
            }
        }
    }

    #[test]
    fn test_weekend_rejects_small_pool() {
        let mut rng = DrawRng::new(1);
        let err = weekend(
            date(2025, 9, 21),
            &pool(&["A-name", "B-name", "C-name"]),
            &HashSet::new(),
            &mut rng,
        );
        assert_eq!(err, Err(Error::PoolTooSmall { need: 4, have: 3 }));
    }

    #[test]
    fn test_weekend_assigns_both_days_without_repeats() {
        let p = pool(&[
            "A-name", "B-name", "C-name", "D-name", "E-name", "F-name", "G-name", "H-name",
            "I-name", "J-name", "K-name", "L-name",
        ]);
        for seed in 1..=20 {
            let mut rng = DrawRng::new(seed);
            let recs = weekend(date(2025, 9, 21), &p, &HashSet::new(), &mut rng).unwrap();
            assert_eq!(recs.len(), 2);
            // Sunday run targets the following weekend.
            assert_eq!(recs[0].target(), date(2025, 9, 27));
            assert_eq!(recs[1].target(), date(2025, 9, 28));

            let mut seen = HashSet::new();
            for rec in &recs {
                for name in rec.names() {
                    assert!(seen.insert(name.to_string()), "{name} repeated across days");
                }
            }
        }
    }

    #[test]
    fn test_weekend_passenger_excludes_week_assignments() {
        let p = pool(&[
            "A-name", "B-name", "C-name", "D-name", "E-name", "F-name", "G-name", "H-name",
            "I-name", "J-name", "K-name", "L-name",
        ]);
        let assigned = canonical_set(["A-name", "B-name"]);
        for seed in 1..=20 {
            let mut rng = DrawRng::new(seed);
            let recs = weekend(date(2025, 9, 21), &p, &assigned, &mut rng).unwrap();
            for rec in &recs {
                if let DrawRecord::Weekend {
                    passenger,
                    passenger_backups,
                    ..
                } = rec
                {
                    assert_ne!(passenger, "A-name");
                    assert_ne!(passenger, "B-name");
                    assert!(!passenger_backups.contains(&"A-name".to_string()));
                    assert!(!passenger_backups.contains(&"B-name".to_string()));
                }
            }
        }
    }

    #[test]
    fn test_weekend_midweek_targets_this_weekend() {
        let mut rng = DrawRng::new(5);
        let p = pool(&[
            "A-name", "B-name", "C-name", "D-name", "E-name", "F-name", "G-name", "H-name",
            "I-name", "J-name", "K-name", "L-name",
        ]);
        let recs = weekend(date(2025, 9, 17), &p, &HashSet::new(), &mut rng).unwrap();
        assert_eq!(recs[0].target(), date(2025, 9, 20));
        assert_eq!(recs[1].target(), date(2025, 9, 21));
    }
}
