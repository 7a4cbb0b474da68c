//! Per-week append-only CSV logs
//!
//! Every ISO week owns a pair of log files named by the week's closing
//! Sunday: a registrations log and a draws log. Writes open, append one
//! line and close; redo operations rewrite a filtered copy through a
//! temp file. The legacy file names and headers are kept verbatim so
//! data directories written by earlier deployments keep working.

use crate::error::Result;
use convoy_core::{calendar, DrawRecord};
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const REGISTRATIONS_HEADER: &str = "fecha_dia,nombre_comandante,puntos";
const DRAWS_HEADER: &str = "fecha,semana,tipo,detalle";

/// Handle for one ISO week's log file pair.
#[derive(Debug, Clone)]
pub struct WeekLog {
    dir: PathBuf,
    sunday: NaiveDate,
}

/// A parsed draws-log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRow {
    /// Calendar date the row was appended for.
    pub date: NaiveDate,
    /// ISO week key recorded with the row.
    pub week: String,
    pub record: DrawRecord,
}

/// A parsed registrations-log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRow {
    pub day: NaiveDate,
    pub name: String,
    pub points: i64,
}

/// Week file pair discovered in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekFiles {
    pub week: String,
    pub sunday: NaiveDate,
    pub registrations: Option<String>,
    pub draws: Option<String>,
}

impl WeekLog {
    /// The log pair for the ISO week containing `any_day`.
    pub fn for_date(dir: impl Into<PathBuf>, any_day: NaiveDate) -> Self {
        Self {
            dir: dir.into(),
            sunday: calendar::closing_sunday(any_day),
        }
    }

    pub fn sunday(&self) -> NaiveDate {
        self.sunday
    }

    pub fn week_key(&self) -> String {
        calendar::iso_week_key(self.sunday)
    }

    pub fn registrations_path(&self) -> PathBuf {
        self.dir
            .join(format!("Vs{}_registros.csv", calendar::day_stamp(self.sunday)))
    }

    pub fn draws_path(&self) -> PathBuf {
        self.dir
            .join(format!("Vs{}_sorteos.csv", calendar::day_stamp(self.sunday)))
    }

    /// Append one registration row, creating the file with its header on
    /// first write.
    pub fn append_registration(&self, day: NaiveDate, name: &str, points: i64) -> Result<()> {
        append_line(
            &self.registrations_path(),
            REGISTRATIONS_HEADER,
            &format!(
                "{},{},{}",
                calendar::day_stamp(day),
                escape_csv(name),
                points
            ),
        )
    }

    /// Append one draw row. `as_of` supplies the row's date and week
    /// columns and should lie inside this log's week.
    pub fn append_draw(&self, as_of: NaiveDate, record: &DrawRecord) -> Result<()> {
        append_line(
            &self.draws_path(),
            DRAWS_HEADER,
            &format!(
                "{},{},{},{}",
                calendar::day_stamp(as_of),
                calendar::iso_week_key(as_of),
                escape_csv(record.kind_code()),
                escape_csv(&record.detail()),
            ),
        )
    }

    /// All parseable draw rows; a missing file reads as empty, rows that
    /// fail to decode are skipped.
    pub fn draws(&self) -> Result<Vec<DrawRow>> {
        let mut out = Vec::new();
        for fields in read_rows(&self.draws_path())? {
            if fields.len() < 4 {
                continue;
            }
            let Some(date) = calendar::parse_day_stamp(&fields[0]) else {
                continue;
            };
            let Some(record) = DrawRecord::parse(&fields[2], &fields[3]) else {
                log::debug!("skipping unparsable draw row: {fields:?}");
                continue;
            };
            out.push(DrawRow {
                date,
                week: fields[1].clone(),
                record,
            });
        }
        Ok(out)
    }

    /// All parseable registration rows.
    pub fn registrations(&self) -> Result<Vec<RegistrationRow>> {
        let mut out = Vec::new();
        for fields in read_rows(&self.registrations_path())? {
            if fields.len() < 3 {
                continue;
            }
            let (Some(day), Ok(points)) = (
                calendar::parse_day_stamp(&fields[0]),
                fields[2].parse::<i64>(),
            ) else {
                continue;
            };
            out.push(RegistrationRow {
                day,
                name: fields[1].clone(),
                points,
            });
        }
        Ok(out)
    }

    /// A weekly draw has already been written into this week's log.
    pub fn has_weekly_draw(&self) -> bool {
        self.draws()
            .map(|rows| {
                rows.iter()
                    .any(|r| matches!(r.record, DrawRecord::Weekly { .. }))
            })
            .unwrap_or(false)
    }

    /// A daily draw targeting `target` exists in this week's log.
    pub fn has_daily_draw_for(&self, target: NaiveDate) -> bool {
        self.draws()
            .map(|rows| {
                rows.iter().any(|r| {
                    matches!(r.record, DrawRecord::Daily { .. }) && r.record.target() == target
                })
            })
            .unwrap_or(false)
    }

    /// Remove every daily row targeting `target`, rewriting the log.
    /// Returns the number of removed rows.
    pub fn remove_daily_for(&self, target: NaiveDate) -> Result<usize> {
        rewrite_filtered(&self.draws_path(), |kind, detail| {
            match DrawRecord::parse(kind, detail) {
                Some(DrawRecord::Daily { target: t, .. }) => t != target,
                _ => true,
            }
        })
    }

    /// Remove every weekly row recorded under `week_key` from this log.
    pub fn remove_weekly_for(&self, week_key: &str) -> Result<usize> {
        let week_key = week_key.to_string();
        rewrite_filtered_with_week(&self.draws_path(), move |week, kind, _detail| {
            !(week == week_key && kind.eq_ignore_ascii_case("W"))
        })
    }
}

/// Remove weekly rows for `week_key` across every draws log in `dir`.
pub fn remove_weekly(dir: &Path, week_key: &str) -> Result<usize> {
    let mut removed = 0;
    for files in list_weeks(dir)? {
        if files.draws.is_some() {
            let log = WeekLog::for_date(dir, files.sunday);
            removed += log.remove_weekly_for(week_key)?;
        }
    }
    Ok(removed)
}

/// Discover week file pairs in the data directory, ascending by week.
pub fn list_weeks(dir: &Path) -> Result<Vec<WeekFiles>> {
    let mut by_sunday: Vec<WeekFiles> = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some((stamp, kind)) = split_week_file_name(name) else {
            continue;
        };
        let Some(sunday) = calendar::parse_day_stamp(stamp) else {
            continue;
        };
        let slot = match by_sunday.iter_mut().find(|w| w.sunday == sunday) {
            Some(slot) => slot,
            None => {
                by_sunday.push(WeekFiles {
                    week: calendar::iso_week_key(sunday),
                    sunday,
                    registrations: None,
                    draws: None,
                });
                by_sunday.last_mut().unwrap()
            }
        };
        match kind {
            "registros" => slot.registrations = Some(name.to_string()),
            "sorteos" => slot.draws = Some(name.to_string()),
            _ => {}
        }
    }
    by_sunday.sort_by(|a, b| a.week.cmp(&b.week));
    Ok(by_sunday)
}

/// `VsYYYYMMDD_registros.csv` / `VsYYYYMMDD_sorteos.csv`.
fn split_week_file_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix("Vs")?;
    let rest = rest.strip_suffix(".csv")?;
    let (stamp, kind) = rest.split_once('_')?;
    if stamp.len() != 8 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((stamp, kind))
}

fn append_line(path: &Path, header: &str, line: &str) -> Result<()> {
    let header_needed = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if header_needed {
        writeln!(file, "{header}")?;
    }
    writeln!(file, "{line}")?;
    Ok(())
}

fn rewrite_filtered<F>(path: &Path, keep: F) -> Result<usize>
where
    F: Fn(&str, &str) -> bool,
{
    rewrite_filtered_with_week(path, move |_week, kind, detail| keep(kind, detail))
}

/// Rewrite the draws log keeping rows the predicate accepts; rows that
/// do not even parse as four fields are preserved untouched.
fn rewrite_filtered_with_week<F>(path: &Path, keep: F) -> Result<usize>
where
    F: Fn(&str, &str, &str) -> bool,
{
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    let mut kept_lines: Vec<&str> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if i == 0 || line.trim().is_empty() {
            continue; // header rewritten below, blank lines dropped
        }
        let fields = parse_csv_line(line);
        if fields.len() >= 4 && !keep(&fields[1], &fields[2], &fields[3]) {
            removed += 1;
            continue;
        }
        kept_lines.push(line);
    }

    if removed == 0 {
        return Ok(0);
    }

    let mut out = String::with_capacity(content.len());
    out.push_str(DRAWS_HEADER);
    out.push('\n');
    for line in kept_lines {
        out.push_str(line);
        out.push('\n');
    }

    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, out)?;
    fs::rename(&tmp, path)?;
    Ok(removed)
}

/// Data rows of a CSV file as parsed fields; header skipped, missing
/// file reads as empty.
fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(content
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(parse_csv_line)
        .collect())
}

fn escape_csv(s: &str) -> String {
    if s.contains(['"', ',', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    cur.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cur.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut cur)),
                _ => cur.push(c),
            }
        }
    }
    fields.push(cur);
    fields
}
