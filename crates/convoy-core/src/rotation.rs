//! Two-week driver rotation
//!
//! A fixed roster of up to ten drivers covers weekday slots: indices 0-4
//! are week A, 5-9 week B, selected by the parity of whole weeks elapsed
//! since a configured anchor Monday. Missing slots resolve to a
//! `Pending` sentinel, never an error.

use crate::calendar;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sentinel for an unfilled rotation slot.
pub const PENDING: &str = "Pending";

/// Maximum roster size: two five-day weeks.
pub const ROSTER_SIZE: usize = 10;

/// Persistent train configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainConfig {
    #[serde(default)]
    pub drivers: Vec<String>,
    #[serde(default)]
    pub anchor_monday: Option<NaiveDate>,
    #[serde(default = "default_post_full")]
    pub post_full_on_monday: bool,
}

fn default_post_full() -> bool {
    true
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            drivers: Vec::new(),
            anchor_monday: None,
            post_full_on_monday: true,
        }
    }
}

impl TrainConfig {
    /// Roster plus anchor are both present.
    pub fn is_ready(&self) -> bool {
        self.anchor_monday.is_some() && !self.drivers.is_empty()
    }
}

/// Driver slot for `day`, or `None` on Saturday/Sunday.
///
/// Anchors and days are normalized to their Mondays, so any date inside
/// the anchor week works. A short or blank roster slot yields
/// [`PENDING`].
pub fn driver_for_day(
    drivers: &[String],
    anchor_monday: NaiveDate,
    day: NaiveDate,
) -> Option<String> {
    let weekday = day.weekday().number_from_monday();
    if weekday > 5 {
        return None;
    }

    let anchor = calendar::monday_of(anchor_monday);
    let monday = calendar::monday_of(day);
    let weeks = (monday - anchor).num_days().div_euclid(7);
    let base = if weeks.rem_euclid(2) == 0 { 0 } else { 5 };
    let idx = base + (weekday as usize - 1);

    let name = drivers.get(idx).map(|s| s.trim()).unwrap_or("");
    if name.is_empty() {
        Some(PENDING.to_string())
    } else {
        Some(name.to_string())
    }
}

/// Mon-Fri preview for the week containing `any_day`.
pub fn weekly_preview(
    drivers: &[String],
    anchor_monday: NaiveDate,
    any_day: NaiveDate,
) -> Vec<(NaiveDate, String)> {
    let monday = calendar::monday_of(any_day);
    (0..5)
        .map(|i| {
            let day = monday + Duration::days(i);
            let driver =
                driver_for_day(drivers, anchor_monday, day).unwrap_or_else(|| PENDING.to_string());
            (day, driver)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roster() -> Vec<String> {
        (1..=10).map(|i| format!("Driver{i:02}")).collect()
    }

    #[test]
    fn test_week_a_and_b_parity() {
        let anchor = date(2025, 9, 15); // Monday
        // Anchor week: indices 0..4.
        assert_eq!(
            driver_for_day(&roster(), anchor, date(2025, 9, 15)),
            Some("Driver01".to_string())
        );
        assert_eq!(
            driver_for_day(&roster(), anchor, date(2025, 9, 19)),
            Some("Driver05".to_string())
        );
        // Next week: indices 5..9.
        assert_eq!(
            driver_for_day(&roster(), anchor, date(2025, 9, 22)),
            Some("Driver06".to_string())
        );
        // Two weeks out: back to week A.
        assert_eq!(
            driver_for_day(&roster(), anchor, date(2025, 9, 29)),
            Some("Driver01".to_string())
        );
    }

    #[test]
    fn test_weekend_has_no_driver() {
        let anchor = date(2025, 9, 15);
        assert_eq!(driver_for_day(&roster(), anchor, date(2025, 9, 20)), None);
        assert_eq!(driver_for_day(&roster(), anchor, date(2025, 9, 21)), None);
    }

    #[test]
    fn test_days_before_anchor_still_rotate() {
        let anchor = date(2025, 9, 15);
        // One week before the anchor is week B by parity.
        assert_eq!(
            driver_for_day(&roster(), anchor, date(2025, 9, 8)),
            Some("Driver06".to_string())
        );
        // Two weeks before is week A again.
        assert_eq!(
            driver_for_day(&roster(), anchor, date(2025, 9, 1)),
            Some("Driver01".to_string())
        );
    }

    #[test]
    fn test_missing_slots_are_pending() {
        let short = vec!["OnlyOne".to_string()];
        let anchor = date(2025, 9, 15);
        assert_eq!(
            driver_for_day(&short, anchor, date(2025, 9, 16)),
            Some(PENDING.to_string())
        );
        let blank = vec!["A".into(), "  ".into(), "C".into()];
        assert_eq!(
            driver_for_day(&blank, anchor, date(2025, 9, 16)),
            Some(PENDING.to_string())
        );
        assert_eq!(
            driver_for_day(&[], anchor, date(2025, 9, 16)),
            Some(PENDING.to_string())
        );
    }

    #[test]
    fn test_weekly_preview() {
        let preview = weekly_preview(&roster(), date(2025, 9, 15), date(2025, 9, 24));
        assert_eq!(preview.len(), 5);
        assert_eq!(preview[0].0, date(2025, 9, 22));
        assert_eq!(preview[0].1, "Driver06");
        assert_eq!(preview[4].1, "Driver10");
    }
}
