//! The structured store document
//!
//! One serialized object holds every persistent section except the
//! weekly logs: event schedules, train configuration, automation toggle
//! overrides, fired marks and the points buckets. The on-disk JSON
//! layout matches the data files of earlier deployments, so a document
//! written by one can be loaded unchanged.

use chrono::{DateTime, Utc};
use convoy_core::points::WeekPoints;
use convoy_core::{EventKind, EventSchedule, TrainConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Automation features that can be toggled at runtime.
///
/// The store holds per-flag overrides; a flag without an override falls
/// back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFlag {
    DrawDaily,
    DrawWeekly,
    VsReminder,
    TrainPost,
}

impl AutoFlag {
    pub const ALL: [AutoFlag; 4] = [
        AutoFlag::DrawDaily,
        AutoFlag::DrawWeekly,
        AutoFlag::VsReminder,
        AutoFlag::TrainPost,
    ];

    /// Stable key used in the document and in operator commands.
    pub fn key(&self) -> &'static str {
        match self {
            AutoFlag::DrawDaily => "AUTO_DRAW_D",
            AutoFlag::DrawWeekly => "AUTO_DRAW_W",
            AutoFlag::VsReminder => "AUTO_VS_REMINDER",
            AutoFlag::TrainPost => "AUTO_TRAIN_POST",
        }
    }

    pub fn from_key(key: &str) -> Option<AutoFlag> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// The whole structured state, loaded and atomically replaced as one
/// unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Event kind code to schedule; `null` values mean "never set".
    #[serde(default)]
    pub schedules: IndexMap<String, Option<EventSchedule>>,
    #[serde(default)]
    pub train: TrainConfig,
    /// Toggle overrides; `null` means "use the configured default".
    #[serde(default)]
    pub auto: IndexMap<String, Option<bool>>,
    /// Idempotence marks: key to the instant the action fired.
    #[serde(default)]
    pub fired_marks: IndexMap<String, DateTime<Utc>>,
    /// ISO week key to day stamp to entries.
    #[serde(default)]
    pub points: IndexMap<String, WeekPoints>,
}

impl Document {
    pub fn schedule(&self, kind: EventKind) -> Option<&EventSchedule> {
        self.schedules.get(kind.code()).and_then(Option::as_ref)
    }

    pub fn set_schedule(&mut self, kind: EventKind, schedule: EventSchedule) {
        self.schedules
            .insert(kind.code().to_string(), Some(schedule));
    }

    pub fn auto_override(&self, flag: AutoFlag) -> Option<bool> {
        self.auto.get(flag.key()).copied().flatten()
    }

    pub fn set_auto(&mut self, flag: AutoFlag, value: bool) {
        self.auto.insert(flag.key().to_string(), Some(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::GameCalendar;
    use chrono::TimeZone;

    #[test]
    fn test_legacy_layout_loads() {
        // A document shaped like the files earlier deployments wrote.
        let raw = r#"{
            "schedules": {
                "MG": {
                    "first_utc": "2025-09-15T12:00:00+00:00",
                    "hhmm_server": "1000",
                    "weekend_hhmm": null,
                    "repeat_days": 2,
                    "updated_at": "2025-09-14T08:00:00+00:00"
                },
                "ZS": null
            },
            "train": {
                "drivers": ["A", "B"],
                "anchor_monday": "2025-09-15",
                "post_full_on_monday": true
            },
            "auto": {"AUTO_DRAW_D": false, "AUTO_DRAW_W": null},
            "fired_marks": {"VS:2025-09-20:2345": "2025-09-21T01:45:10+00:00"},
            "points": {
                "2025-38": {
                    "20250915": [{"name": "Alice", "points": 7200000}]
                }
            }
        }"#;
        let doc: Document = serde_json::from_str(raw).unwrap();
        assert!(doc.schedule(EventKind::Mg).is_some());
        assert!(doc.schedule(EventKind::Zs).is_none());
        assert_eq!(doc.auto_override(AutoFlag::DrawDaily), Some(false));
        assert_eq!(doc.auto_override(AutoFlag::DrawWeekly), None);
        assert!(doc.fired_marks.contains_key("VS:2025-09-20:2345"));
        assert_eq!(doc.points["2025-38"]["20250915"][0].points, 7_200_000);
        assert_eq!(
            doc.train.anchor_monday,
            chrono::NaiveDate::from_ymd_opt(2025, 9, 15)
        );
    }

    #[test]
    fn test_roundtrip() {
        let cal = GameCalendar::default();
        let mut doc = Document::default();
        let at = Utc.with_ymd_and_hms(2025, 9, 14, 8, 0, 0).unwrap();
        let sched =
            EventSchedule::from_server_strings(&cal, "20250915", "1000", Some("1800"), 2, at)
                .unwrap();
        doc.set_schedule(EventKind::Mg, sched.clone());
        doc.set_auto(AutoFlag::TrainPost, true);

        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schedule(EventKind::Mg), Some(&sched));
        assert_eq!(back.auto_override(AutoFlag::TrainPost), Some(true));
    }

    #[test]
    fn test_missing_sections_default() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert!(doc.schedules.is_empty());
        assert!(doc.train.drivers.is_empty());
        assert!(doc.train.post_full_on_monday);
        assert!(doc.fired_marks.is_empty());
    }

    #[test]
    fn test_auto_flag_keys() {
        assert_eq!(AutoFlag::DrawDaily.key(), "AUTO_DRAW_D");
        assert_eq!(
            AutoFlag::from_key("AUTO_VS_REMINDER"),
            Some(AutoFlag::VsReminder)
        );
        assert_eq!(AutoFlag::from_key("AUTO_NOPE"), None);
    }
}
