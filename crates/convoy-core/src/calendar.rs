//! Game-calendar arithmetic
//!
//! The game day does not align with UTC midnight: a new day begins at a
//! configurable cutover hour (02:00 UTC by default). The in-game "server
//! clock" runs behind UTC by exactly the cutover, so 00:00 server equals
//! the cutover instant in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Default daily cutover hour (UTC).
pub const DEFAULT_CUTOVER_HOUR: u32 = 2;

/// Calendar with a fixed daily cutover hour.
///
/// All conversions between wall-clock instants, server-clock times and
/// game dates go through this type; everything here is a pure total
/// function over valid instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCalendar {
    cutover_hour: u32,
}

impl GameCalendar {
    /// Create a calendar with the given cutover hour (clamped to 0..=23).
    pub fn new(cutover_hour: u32) -> Self {
        Self {
            cutover_hour: cutover_hour.min(23),
        }
    }

    pub fn cutover_hour(&self) -> u32 {
        self.cutover_hour
    }

    /// Game date for a UTC instant: same date at or after the cutover,
    /// previous date before it.
    pub fn to_game_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        if instant.time() >= NaiveTime::from_hms_opt(self.cutover_hour, 0, 0).unwrap() {
            instant.date_naive()
        } else {
            instant.date_naive() - Duration::days(1)
        }
    }

    /// Canonical representative instant for a game date: noon UTC.
    ///
    /// Noon is safely inside the game day for any cutover below 12, so
    /// arithmetic on representatives never crosses a day boundary.
    pub fn from_game_date(&self, day: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
    }

    /// Convert a naive server-clock datetime to the UTC instant it names.
    pub fn server_to_utc(&self, server: NaiveDateTime) -> DateTime<Utc> {
        Utc.from_utc_datetime(&(server + Duration::hours(self.cutover_hour as i64)))
    }

    /// The server-clock datetime for a UTC instant.
    pub fn utc_to_server(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc() - Duration::hours(self.cutover_hour as i64)
    }

    /// Server-clock time of day as `(hour, minute)`.
    pub fn server_hhmm(&self, instant: DateTime<Utc>) -> (u32, u32) {
        use chrono::Timelike;
        let t = self.utc_to_server(instant).time();
        (t.hour(), t.minute())
    }
}

impl Default for GameCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOVER_HOUR)
    }
}

/// ISO week key, `{iso_year}-{iso_week:02}`.
pub fn iso_week_key(day: NaiveDate) -> String {
    let iso = day.iso_week();
    format!("{}-{:02}", iso.year(), iso.week())
}

/// Monday of the ISO week containing `day`.
pub fn monday_of(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Sunday that closes the ISO week containing `day`; keys the weekly logs.
pub fn closing_sunday(day: NaiveDate) -> NaiveDate {
    monday_of(day) + Duration::days(6)
}

/// Monday through Saturday of the ISO week containing `day`.
pub fn week_mon_sat(day: NaiveDate) -> [NaiveDate; 6] {
    let monday = monday_of(day);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// Monday through Friday of the ISO week containing `day`.
pub fn week_mon_fri(day: NaiveDate) -> [NaiveDate; 5] {
    let monday = monday_of(day);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// `YYYYMMDD` stamp used in log rows, file names and record targets.
pub fn day_stamp(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

/// Parse a `YYYYMMDD` stamp.
pub fn parse_day_stamp(stamp: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(stamp, "%Y%m%d").ok()
}

/// Parse a `YYYY-WW` ISO week key to the Monday of that week.
pub fn parse_week_key(key: &str) -> Option<NaiveDate> {
    let (year, week) = key.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon)
}

/// Offset from Monday (0..=5) for a `mon`..`sat` day abbreviation.
pub fn parse_day_abbrev(abbrev: &str) -> Option<u32> {
    match abbrev.trim().to_ascii_lowercase().as_str() {
        "mon" | "monday" => Some(0),
        "tue" | "tuesday" => Some(1),
        "wed" | "wednesday" => Some(2),
        "thu" | "thursday" => Some(3),
        "fri" | "friday" => Some(4),
        "sat" | "saturday" => Some(5),
        _ => None,
    }
}

/// Monday through Saturday: the days the alliance event runs on.
pub fn is_vs_day(day: NaiveDate) -> bool {
    day.weekday().number_from_monday() <= 6
}

/// Monday through Friday.
pub fn is_weekday(day: NaiveDate) -> bool {
    day.weekday().number_from_monday() <= 5
}

/// Saturday or Sunday.
pub fn is_weekend(day: NaiveDate) -> bool {
    day.weekday().number_from_monday() >= 6
}
