//! Document store with load / mutate / atomic-replace semantics
//!
//! Every write loads the whole document, mutates it in memory and
//! replaces the file through a temp-then-rename, so a torn document is
//! never observable. There is no cross-process locking: the design
//! assumes a single writer process.
//!
//! A document that fails to parse is treated as empty; the damaged file
//! is preserved next to the store and an error is logged, so nothing is
//! silently discarded.

use crate::document::{AutoFlag, Document};
use crate::error::Result;
use crate::weeklog::WeekLog;
use chrono::{DateTime, NaiveDate, Utc};
use convoy_core::{
    calendar, points, Error as CoreError, EventKind, EventSchedule, GameCalendar, TrainConfig,
    WeeklySummary,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DOCUMENT_FILE: &str = "data.json";
const TEMP_FILE: &str = "data.json.tmp";
const CORRUPT_FILE: &str = "data.json.corrupt";

/// Outcome of a points registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub week: String,
    pub day: NaiveDate,
    /// Display name after reconciliation.
    pub name: String,
    /// The day total now on record.
    pub day_total: i64,
    /// An earlier entry for the same identity was replaced.
    pub replaced: bool,
}

/// The process-wide persistent store.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    /// Open (creating the data directory if needed).
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE)
    }

    /// Load the current document. A missing file is an empty store; a
    /// corrupt file is preserved aside, logged and treated as empty.
    pub fn load(&self) -> Document {
        let path = self.document_path();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Document::default(),
            Err(e) => {
                log::error!("failed to read {}: {e}", path.display());
                return Document::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                log::error!(
                    "store document {} is corrupt ({e}); continuing with an empty store, \
                     keeping the damaged file as {CORRUPT_FILE}",
                    path.display()
                );
                if let Err(e) = fs::rename(&path, self.data_dir.join(CORRUPT_FILE)) {
                    log::error!("failed to preserve corrupt document: {e}");
                }
                Document::default()
            }
        }
    }

    /// Atomically replace the document on disk.
    pub fn replace(&self, doc: &Document) -> Result<()> {
        let tmp = self.data_dir.join(TEMP_FILE);
        fs::write(&tmp, serde_json::to_vec_pretty(doc)?)?;
        fs::rename(&tmp, self.document_path())?;
        Ok(())
    }

    /// Load, mutate, replace.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Result<R> {
        let mut doc = self.load();
        let out = f(&mut doc);
        self.replace(&doc)?;
        Ok(out)
    }

    /// Modification time of the document, for the quiet-period guard.
    /// `None` means the document has never been written.
    pub fn last_write_at(&self) -> std::io::Result<Option<SystemTime>> {
        match fs::metadata(self.document_path()) {
            Ok(meta) => meta.modified().map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The log pair for the ISO week containing `any_day`.
    pub fn week_log(&self, any_day: NaiveDate) -> WeekLog {
        WeekLog::for_date(&self.data_dir, any_day)
    }

    // ---------- schedules ----------

    pub fn schedule(&self, kind: EventKind) -> Option<EventSchedule> {
        self.load().schedule(kind).cloned()
    }

    pub fn set_schedule(&self, kind: EventKind, schedule: EventSchedule) -> Result<()> {
        self.mutate(|doc| doc.set_schedule(kind, schedule))
    }

    // ---------- train ----------

    pub fn train_config(&self) -> TrainConfig {
        self.load().train
    }

    /// Set the driver roster, truncated to the two-week rotation size.
    pub fn set_train_drivers(&self, drivers: Vec<String>) -> Result<()> {
        self.mutate(|doc| {
            doc.train.drivers = drivers
                .into_iter()
                .take(convoy_core::rotation::ROSTER_SIZE)
                .collect();
        })
    }

    /// Set the rotation anchor; must be a Monday.
    pub fn set_train_anchor(&self, anchor: NaiveDate) -> Result<()> {
        use chrono::Datelike;
        if anchor.weekday().number_from_monday() != 1 {
            return Err(CoreError::NotMonday(anchor).into());
        }
        self.mutate(|doc| doc.train.anchor_monday = Some(anchor))
    }

    pub fn set_train_post_full(&self, value: bool) -> Result<()> {
        self.mutate(|doc| doc.train.post_full_on_monday = value)
    }

    // ---------- automation toggles ----------

    pub fn auto_override(&self, flag: AutoFlag) -> Option<bool> {
        self.load().auto_override(flag)
    }

    pub fn set_auto(&self, flag: AutoFlag, value: bool) -> Result<()> {
        self.mutate(|doc| doc.set_auto(flag, value))
    }

    // ---------- fired marks ----------

    /// Record that the action behind `key` has fired. Write-once: a
    /// present mark is never overwritten, so the original fire time is
    /// kept.
    pub fn mark_fired(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        self.mutate(|doc| {
            doc.fired_marks.entry(key.to_string()).or_insert(at);
        })
    }

    pub fn has_fired(&self, key: &str) -> bool {
        self.load().fired_marks.contains_key(key)
    }

    // ---------- points ----------

    /// Register a player's day total, reconciling the name against the
    /// day's existing entries and appending to the week's registrations
    /// log.
    pub fn register_points(
        &self,
        cal: &GameCalendar,
        now: DateTime<Utc>,
        name: &str,
        amount: i64,
        day_key: Option<&str>,
    ) -> Result<Registration> {
        let target = points::registration_target(cal, now, day_key)?;
        let week = calendar::iso_week_key(target);
        let stamp = calendar::day_stamp(target);

        let applied = self.mutate(|doc| {
            let entries = doc
                .points
                .entry(week.clone())
                .or_default()
                .entry(stamp.clone())
                .or_default();
            points::apply_registration(entries, name, amount)
        })?;

        self.week_log(target)
            .append_registration(target, &applied.name, amount)?;

        Ok(Registration {
            week,
            day: target,
            name: applied.name,
            day_total: applied.day_total,
            replaced: applied.replaced,
        })
    }

    /// Derived summary for the ISO week containing `any_day`.
    pub fn weekly_summary(&self, any_day: NaiveDate, threshold: i64) -> WeeklySummary {
        let doc = self.load();
        let week = calendar::iso_week_key(any_day);
        let empty = points::WeekPoints::default();
        let days = doc.points.get(&week).unwrap_or(&empty);
        WeeklySummary::compute(days, any_day, threshold)
    }

    /// Drop the in-document points of one ISO week; the CSV logs are
    /// untouched. Returns whether the week existed.
    pub fn clear_week(&self, week_key: &str) -> Result<bool> {
        self.mutate(|doc| doc.points.shift_remove(week_key).is_some())
    }

    /// Reset the whole document to empty. Log files are untouched.
    pub fn wipe_all(&self) -> Result<()> {
        self.replace(&Document::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const THRESHOLD: i64 = 7_200_000;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_store_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let doc = store.load();
        assert!(doc.schedules.is_empty());
        assert!(store.last_write_at().unwrap().is_none());
    }

    #[test]
    fn test_fired_marks_survive_reload() {
        let dir = TempDir::new().unwrap();
        let at = utc(2025, 9, 21, 1, 45);
        {
            let store = Store::open(dir.path()).unwrap();
            assert!(!store.has_fired("VS:2025-09-20:2345"));
            store.mark_fired("VS:2025-09-20:2345", at).unwrap();
            assert!(store.has_fired("VS:2025-09-20:2345"));
        }
        // Fresh handle over the same directory: the mark persists.
        let store = Store::open(dir.path()).unwrap();
        assert!(store.has_fired("VS:2025-09-20:2345"));

        // Write-once: a second mark does not move the timestamp.
        store
            .mark_fired("VS:2025-09-20:2345", utc(2025, 9, 22, 0, 0))
            .unwrap();
        assert_eq!(store.load().fired_marks["VS:2025-09-20:2345"], at);
    }

    #[test]
    fn test_corrupt_document_recovers_empty_and_keeps_copy() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.mark_fired("K", utc(2025, 9, 21, 0, 0)).unwrap();
        fs::write(dir.path().join(DOCUMENT_FILE), "{not json at all").unwrap();

        let doc = store.load();
        assert!(doc.fired_marks.is_empty());
        assert!(dir.path().join(CORRUPT_FILE).exists());
        // The store is writable again afterwards.
        store.mark_fired("K2", utc(2025, 9, 21, 0, 1)).unwrap();
        assert!(store.has_fired("K2"));
    }

    #[test]
    fn test_schedule_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let cal = GameCalendar::default();
        let sched = EventSchedule::from_server_strings(
            &cal,
            "20250915",
            "1000",
            Some("1800"),
            EventKind::Mg.default_repeat_days(),
            utc(2025, 9, 14, 8, 0),
        )
        .unwrap();
        assert!(store.schedule(EventKind::Mg).is_none());
        store.set_schedule(EventKind::Mg, sched.clone()).unwrap();
        assert_eq!(store.schedule(EventKind::Mg), Some(sched));
        assert!(store.schedule(EventKind::Zs).is_none());
    }

    #[test]
    fn test_train_anchor_must_be_monday() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = store.set_train_anchor(date(2025, 9, 16));
        assert!(matches!(
            err,
            Err(crate::Error::Domain(CoreError::NotMonday(_)))
        ));
        store.set_train_anchor(date(2025, 9, 15)).unwrap();
        assert_eq!(store.train_config().anchor_monday, Some(date(2025, 9, 15)));
    }

    #[test]
    fn test_train_roster_truncates_to_ten() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let roster: Vec<String> = (0..14).map(|i| format!("D{i}")).collect();
        store.set_train_drivers(roster).unwrap();
        assert_eq!(store.train_config().drivers.len(), 10);
    }

    #[test]
    fn test_auto_toggle_override() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.auto_override(AutoFlag::DrawDaily), None);
        store.set_auto(AutoFlag::DrawDaily, false).unwrap();
        assert_eq!(store.auto_override(AutoFlag::DrawDaily), Some(false));
    }

    #[test]
    fn test_register_points_replaces_and_logs() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let cal = GameCalendar::default();
        // Wednesday 2025-09-17: implicit target is Tuesday.
        let now = utc(2025, 9, 17, 10, 0);

        let first = store
            .register_points(&cal, now, "ChikenLobo", 7_000_000, None)
            .unwrap();
        assert_eq!(first.day, date(2025, 9, 16));
        assert_eq!(first.week, "2025-38");
        assert!(!first.replaced);

        let second = store
            .register_points(&cal, now, "ChickenLobo", 7_500_000, None)
            .unwrap();
        assert!(second.replaced);
        assert_eq!(second.name, "ChickenLobo");
        assert_eq!(second.day_total, 7_500_000);

        let summary = store.weekly_summary(date(2025, 9, 16), THRESHOLD);
        assert_eq!(summary.players.len(), 1);
        assert_eq!(summary.players[0].total, 7_500_000);

        // Both registrations were appended to the week's log.
        let rows = store.week_log(date(2025, 9, 16)).registrations().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "ChickenLobo");
    }

    #[test]
    fn test_register_points_rejects_sunday_key() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let cal = GameCalendar::default();
        let err = store.register_points(&cal, utc(2025, 9, 17, 10, 0), "A", 1, Some("sun"));
        assert!(matches!(
            err,
            Err(crate::Error::Domain(CoreError::InvalidDayKey(_)))
        ));
    }

    #[test]
    fn test_clear_week_and_wipe() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let cal = GameCalendar::default();
        store
            .register_points(&cal, utc(2025, 9, 17, 10, 0), "Alice", 1_000, None)
            .unwrap();
        store.mark_fired("K", utc(2025, 9, 17, 10, 0)).unwrap();

        assert!(store.clear_week("2025-38").unwrap());
        assert!(!store.clear_week("2025-38").unwrap());
        // Marks survive a week clear.
        assert!(store.has_fired("K"));

        store.wipe_all().unwrap();
        assert!(!store.has_fired("K"));
        // The CSV log is preserved through both operations.
        assert_eq!(
            store.week_log(date(2025, 9, 16)).registrations().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_last_write_at_advances() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(store.last_write_at().unwrap().is_none());
        store.mark_fired("K", utc(2025, 9, 17, 10, 0)).unwrap();
        assert!(store.last_write_at().unwrap().is_some());
    }
}
