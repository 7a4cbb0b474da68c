//! Draw records and their wire codec
//!
//! Draw outcomes are modelled as a tagged [`DrawRecord`]; the legacy
//! pipe-delimited detail string (`D|for:20250921|passenger:Alice|...`)
//! survives only inside this module so existing log files keep working.
//! The parser tolerates unknown and missing keys; a row is dropped only
//! when its kind or target date is unusable.

use crate::calendar;
use chrono::NaiveDate;

/// Kind codes as they appear in the draw log's `tipo` column.
pub const KIND_DAILY: &str = "D";
pub const KIND_WEEKLY: &str = "W";
pub const KIND_WEEKEND: &str = "weekend";

/// One persisted draw outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawRecord {
    /// Daily passenger assignment for `target`.
    Daily {
        target: NaiveDate,
        passenger: String,
        backups: Vec<String>,
    },
    /// One of the five weekly passenger assignments.
    Weekly {
        target: NaiveDate,
        passenger: String,
        backups: Vec<String>,
    },
    /// Saturday/Sunday driver + passenger roles.
    Weekend {
        target: NaiveDate,
        driver: String,
        driver_backup: Option<String>,
        passenger: String,
        passenger_backups: Vec<String>,
    },
}

impl DrawRecord {
    pub fn kind_code(&self) -> &'static str {
        match self {
            DrawRecord::Daily { .. } => KIND_DAILY,
            DrawRecord::Weekly { .. } => KIND_WEEKLY,
            DrawRecord::Weekend { .. } => KIND_WEEKEND,
        }
    }

    /// The calendar day this assignment applies to.
    pub fn target(&self) -> NaiveDate {
        match self {
            DrawRecord::Daily { target, .. }
            | DrawRecord::Weekly { target, .. }
            | DrawRecord::Weekend { target, .. } => *target,
        }
    }

    pub fn passenger(&self) -> &str {
        match self {
            DrawRecord::Daily { passenger, .. }
            | DrawRecord::Weekly { passenger, .. }
            | DrawRecord::Weekend { passenger, .. } => passenger,
        }
    }

    /// Every name involved in this assignment, in any role.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            DrawRecord::Daily {
                passenger, backups, ..
            }
            | DrawRecord::Weekly {
                passenger, backups, ..
            } => {
                out.push(passenger.as_str());
                out.extend(backups.iter().map(String::as_str));
            }
            DrawRecord::Weekend {
                driver,
                driver_backup,
                passenger,
                passenger_backups,
                ..
            } => {
                out.push(driver.as_str());
                if let Some(b) = driver_backup {
                    out.push(b.as_str());
                }
                out.push(passenger.as_str());
                out.extend(passenger_backups.iter().map(String::as_str));
            }
        }
        out
    }

    /// Encode the legacy detail string (without the CSV framing).
    pub fn detail(&self) -> String {
        match self {
            DrawRecord::Daily {
                target,
                passenger,
                backups,
            } => format!(
                "{}|for:{}|passenger:{}|backups:{}",
                KIND_DAILY,
                calendar::day_stamp(*target),
                passenger,
                backups.join(",")
            ),
            DrawRecord::Weekly {
                target,
                passenger,
                backups,
            } => format!(
                "{}|for:{}|passenger:{}|backups:{}",
                KIND_WEEKLY,
                calendar::day_stamp(*target),
                passenger,
                backups.join(",")
            ),
            DrawRecord::Weekend {
                target,
                driver,
                driver_backup,
                passenger,
                passenger_backups,
            } => format!(
                "{}|for:{}|driver:{}|driver_backup:{}|passenger:{}|passenger_backups:{}",
                KIND_WEEKEND,
                calendar::day_stamp(*target),
                driver,
                driver_backup.as_deref().unwrap_or(""),
                passenger,
                passenger_backups.join(",")
            ),
        }
    }

    /// Decode a record from its kind column and detail string.
    ///
    /// Returns `None` for an unknown kind or a detail without a parsable
    /// `for:` date; every other missing key degrades to an empty field.
    pub fn parse(kind: &str, detail: &str) -> Option<DrawRecord> {
        let kv = parse_detail_kv(detail);
        let target = calendar::parse_day_stamp(kv_get(&kv, "for")?)?;

        match kind.trim() {
            k if k.eq_ignore_ascii_case(KIND_DAILY) => Some(DrawRecord::Daily {
                target,
                passenger: kv_get(&kv, "passenger").unwrap_or_default().to_string(),
                backups: split_names(kv_get(&kv, "backups")),
            }),
            k if k.eq_ignore_ascii_case(KIND_WEEKLY) => Some(DrawRecord::Weekly {
                target,
                passenger: kv_get(&kv, "passenger").unwrap_or_default().to_string(),
                backups: split_names(kv_get(&kv, "backups")),
            }),
            k if k.eq_ignore_ascii_case(KIND_WEEKEND) => Some(DrawRecord::Weekend {
                target,
                driver: kv_get(&kv, "driver").unwrap_or_default().to_string(),
                driver_backup: kv_get(&kv, "driver_backup")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                passenger: kv_get(&kv, "passenger").unwrap_or_default().to_string(),
                passenger_backups: split_names(kv_get(&kv, "passenger_backups")),
            }),
            _ => None,
        }
    }
}

/// Split a pipe-delimited detail into `key:value` pairs, skipping the
/// leading kind tag and any token without a colon.
fn parse_detail_kv(detail: &str) -> Vec<(String, String)> {
    detail
        .split('|')
        .filter_map(|part| {
            let (k, v) = part.split_once(':')?;
            Some((k.trim().to_ascii_lowercase(), v.trim().to_string()))
        })
        .collect()
}

fn kv_get<'a>(kv: &'a [(String, String)], key: &str) -> Option<&'a str> {
    kv.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn split_names(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_codec() {
        let rec = DrawRecord::Daily {
            target: date(2025, 9, 22),
            passenger: "Alice".to_string(),
            backups: vec!["Bob".to_string(), "Eve".to_string()],
        };
        let detail = rec.detail();
        assert_eq!(detail, "D|for:20250922|passenger:Alice|backups:Bob,Eve");
        assert_eq!(DrawRecord::parse("D", &detail), Some(rec));
    }

    #[test]
    fn test_weekend_codec() {
        let rec = DrawRecord::Weekend {
            target: date(2025, 9, 27),
            driver: "Carl".to_string(),
            driver_backup: Some("Dee".to_string()),
            passenger: "Alice".to_string(),
            passenger_backups: vec!["Bob".to_string()],
        };
        let parsed = DrawRecord::parse("weekend", &rec.detail());
        assert_eq!(parsed, Some(rec));
    }

    #[test]
    fn test_parse_tolerates_unknown_and_missing_keys() {
        let rec = DrawRecord::parse(
            "W",
            "W|for:20250922|passenger:Alice|novelty:whatever",
        )
        .unwrap();
        assert_eq!(rec.passenger(), "Alice");
        assert_eq!(rec.target(), date(2025, 9, 22));
        match rec {
            DrawRecord::Weekly { backups, .. } => assert!(backups.is_empty()),
            _ => panic!("expected weekly record"),
        }

        // No backup names at all
        let rec = DrawRecord::parse("weekend", "weekend|for:20250927|driver:Carl|passenger:Al");
        match rec.unwrap() {
            DrawRecord::Weekend {
                driver_backup,
                passenger_backups,
                ..
            } => {
                assert_eq!(driver_backup, None);
                assert!(passenger_backups.is_empty());
            }
            _ => panic!("expected weekend record"),
        }
    }

    #[test]
    fn test_parse_rejects_unusable_rows() {
        assert_eq!(DrawRecord::parse("D", "D|passenger:Alice"), None);
        assert_eq!(DrawRecord::parse("D", "D|for:garbage|passenger:A"), None);
        assert_eq!(DrawRecord::parse("mystery", "mystery|for:20250922"), None);
    }

    #[test]
    fn test_names_covers_all_roles() {
        let rec = DrawRecord::Weekend {
            target: date(2025, 9, 27),
            driver: "Carl".to_string(),
            driver_backup: Some("Dee".to_string()),
            passenger: "Alice".to_string(),
            passenger_backups: vec!["Bob".to_string(), "Eve".to_string()],
        };
        assert_eq!(rec.names(), vec!["Carl", "Dee", "Alice", "Bob", "Eve"]);
    }
}
