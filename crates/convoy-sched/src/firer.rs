//! The minute-tick evaluation pass
//!
//! One [`Firer::tick`] call evaluates every time-sensitive trigger for
//! the current instant: the registration reminder, automatic draws,
//! event lead-time reminders, the weekly calendar digest and the train
//! posts. The loop driving it is expected to call `tick` once per
//! wall-clock minute; every action is gated by a persisted fired mark,
//! so a restarted process never repeats one.
//!
//! A failing trigger is logged and never aborts the rest of the pass.
//! Delivery is at-most-once: the mark is set whether or not the
//! notifier accepted the message.

use crate::clock::Clock;
use crate::config::Config;
use crate::lineup::{self, DayLineup};
use crate::notify::{DeliveryError, MentionPolicy, Notifier};
use crate::service;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use convoy_core::{calendar, schedule, DrawRng, EventKind, GameCalendar};
use convoy_store::{AutoFlag, Store};

/// Lead-time offsets evaluated for every upcoming occurrence:
/// label, minutes before the occurrence, urgent delivery.
const LEAD_TIMES: [(&str, i64, bool); 4] = [
    ("24h", 24 * 60, false),
    ("12h", 12 * 60, false),
    ("10m", 10, true),
    ("5m", 5, true),
];

/// Half-open match window around a trigger instant, matched to the
/// one-minute tick granularity.
const FIRE_TOLERANCE_SECONDS: i64 = 59;

/// Upcoming occurrences examined per kind; covers the 24h lead for any
/// repeat interval.
const OCCURRENCE_LOOKAHEAD: usize = 3;

pub struct Firer<C: Clock, N: Notifier> {
    cal: GameCalendar,
    cfg: Config,
    store: Store,
    clock: C,
    notifier: N,
    rng: DrawRng,
}

impl<C: Clock, N: Notifier> Firer<C, N> {
    pub fn new(store: Store, cfg: Config, clock: C, notifier: N, rng: DrawRng) -> Self {
        Self {
            cal: GameCalendar::new(cfg.cutover_hour),
            cfg,
            store,
            clock,
            notifier,
            rng,
        }
    }

    /// Evaluate every trigger for the current instant.
    pub fn tick(&mut self) {
        if !self.cfg.announce_enabled {
            return;
        }
        let now = self.clock.now_utc();
        let today = self.cal.to_game_date(now);
        let (h, m) = self.cal.server_hhmm(now);
        let sunday = today.weekday().number_from_monday() == 7;

        // Registration reminder in the last minutes of the game day.
        if (h, m) == (23, 45) && self.enabled(AutoFlag::VsReminder) {
            self.vs_reminder(now, today);
        }

        // Automatic draws shortly after the day rolls over, guarded by a
        // quiet ingest window so they never race live registrations.
        if (h, m) == (0, 30) && self.enabled(AutoFlag::DrawDaily) && self.quiet_period_ok() {
            self.auto_daily_draw(now, today);
        }
        if (h, m) == (0, 30) && sunday && self.enabled(AutoFlag::DrawWeekly) && self.quiet_period_ok()
        {
            self.auto_weekly_draw(now, today);
        }

        for kind in EventKind::ALL {
            self.event_reminders(now, kind);
        }

        // Weekly digest at the start of the week's last day.
        if (h, m) == (0, 0) && sunday {
            self.weekly_digest(now, today);
        }

        if self.enabled(AutoFlag::TrainPost) {
            self.train_posts(now, today, (h, m));
        }
    }

    /// Store override first, configured default second.
    fn enabled(&self, flag: AutoFlag) -> bool {
        self.store.auto_override(flag).unwrap_or(match flag {
            AutoFlag::DrawDaily => self.cfg.auto_draw_daily,
            AutoFlag::DrawWeekly => self.cfg.auto_draw_weekly,
            AutoFlag::VsReminder => self.cfg.auto_vs_reminder,
            AutoFlag::TrainPost => self.cfg.auto_train_post,
        })
    }

    /// No store write within the configured quiet window. A missing
    /// document counts as quiet; a metadata error counts as busy.
    fn quiet_period_ok(&self) -> bool {
        if self.cfg.quiet_minutes <= 0 {
            return true;
        }
        match self.store.last_write_at() {
            Ok(None) => true,
            Ok(Some(at)) => match at.elapsed() {
                Ok(elapsed) => elapsed.as_secs() >= self.cfg.quiet_minutes as u64 * 60,
                Err(_) => false,
            },
            Err(e) => {
                log::warn!("quiet-period check failed: {e}");
                false
            }
        }
    }

    fn vs_reminder(&mut self, now: DateTime<Utc>, today: NaiveDate) {
        let key = format!("VS:{}:2345", today.format("%Y-%m-%d"));
        if self.store.has_fired(&key) {
            return;
        }
        let body = format!(
            "VS {} — last 15 minutes of the game day; register today's points.",
            today.format("%Y-%m-%d")
        );
        self.deliver(&body, MentionPolicy::Safe);
        self.mark(&key, now);
    }

    fn auto_daily_draw(&mut self, now: DateTime<Utc>, today: NaiveDate) {
        let base = today - Duration::days(1);
        if base.weekday().number_from_monday() == 7 {
            return;
        }
        let log = self.store.week_log(base);
        if log.has_weekly_draw() {
            return;
        }
        let target = if base.weekday().number_from_monday() == 6 {
            base + Duration::days(2)
        } else {
            base + Duration::days(1)
        };
        if log.has_daily_draw_for(target) {
            return;
        }
        match service::run_daily_draw(&self.store, &self.cal, self.cfg.threshold, now, &mut self.rng)
        {
            Ok(record) => log::info!("automatic daily draw: {}", record.detail()),
            Err(e) => log::debug!("automatic daily draw skipped: {e}"),
        }
    }

    fn auto_weekly_draw(&mut self, now: DateTime<Utc>, today: NaiveDate) {
        let log = self.store.week_log(today);
        if log.has_weekly_draw() {
            return;
        }
        let summary = self.store.weekly_summary(today, self.cfg.threshold);
        if !summary.is_complete() {
            log::debug!("automatic weekly draw skipped: week dataset incomplete");
            return;
        }
        match service::run_weekly_draw(&self.store, &self.cal, self.cfg.threshold, now, &mut self.rng)
        {
            Ok(records) => log::info!("automatic weekly draw wrote {} assignments", records.len()),
            Err(e) => log::debug!("automatic weekly draw skipped: {e}"),
        }
    }

    fn event_reminders(&mut self, now: DateTime<Utc>, kind: EventKind) {
        let Some(sched) = self.store.schedule(kind) else {
            return;
        };
        let avoid = kind.yields_to().and_then(|k| self.store.schedule(k));
        let occurrences =
            schedule::upcoming(&self.cal, &sched, avoid.as_ref(), now, OCCURRENCE_LOOKAHEAD);

        for occ in occurrences {
            for (label, lead_minutes, urgent) in LEAD_TIMES {
                let fire_at = occ.instant - Duration::minutes(lead_minutes);
                if (now - fire_at).num_seconds().abs() > FIRE_TOLERANCE_SECONDS {
                    continue;
                }
                let key = format!("{}:{}:T-{}", kind.code(), occ.date.format("%Y-%m-%d"), label);
                if self.store.has_fired(&key) {
                    continue;
                }
                let server = self.cal.utc_to_server(occ.instant);
                let eta = fmt_eta((occ.instant - now).num_seconds());
                let body = format!(
                    "{} — {} (server), starts in {eta} ({})",
                    kind.code(),
                    server.format("%Y-%m-%d %H:%M"),
                    kind.title(),
                );
                if urgent {
                    let call = if label == "5m" { "final call!" } else { "be ready!" };
                    self.deliver_urgent(&format!("{body} — {call}"));
                } else {
                    self.deliver(&body, MentionPolicy::Safe);
                }
                self.mark(&key, now);
            }
        }
    }

    fn weekly_digest(&mut self, now: DateTime<Utc>, today: NaiveDate) {
        let key = format!("CAL:{}", calendar::iso_week_key(today));
        if self.store.has_fired(&key) {
            return;
        }
        let monday = calendar::monday_of(today);

        let mut entries: Vec<(u32, DateTime<Utc>, &'static str)> = Vec::new();
        for kind in EventKind::ALL {
            let Some(sched) = self.store.schedule(kind) else {
                continue;
            };
            // A kind configured mid-week would show a partial picture;
            // leave it out until next week.
            if self.cal.to_game_date(sched.updated_at) >= monday {
                continue;
            }
            let avoid = kind.yields_to().and_then(|k| self.store.schedule(k));
            for i in 0..7 {
                let day = monday + Duration::days(i);
                if let Some((instant, _)) =
                    schedule::occurrence_with_avoid(&self.cal, &sched, avoid.as_ref(), day)
                {
                    entries.push((day.weekday().number_from_monday(), instant, kind.code()));
                }
            }
        }
        if entries.is_empty() {
            return;
        }
        entries.sort_by_key(|(weekday, instant, _)| (*weekday, *instant));

        let lines: Vec<String> = entries
            .iter()
            .map(|(_, instant, code)| {
                let server = self.cal.utc_to_server(*instant);
                format!("• {} (server) — {}", server.format("%a %d/%m %H:%M"), code)
            })
            .collect();
        let body = format!("This week's event calendar\n{}", lines.join("\n"));
        self.deliver(&body, MentionPolicy::Safe);
        self.mark(&key, now);
    }

    fn train_posts(&mut self, now: DateTime<Utc>, today: NaiveDate, hhmm: (u32, u32)) {
        if !self.store.train_config().is_ready() {
            return;
        }
        let stamp = calendar::day_stamp(today);
        let key_morning = format!("TRAIN:{stamp}:0100");
        let key_pending = format!("TRAIN:{stamp}:pending");
        let key_afternoon = format!("TRAIN:{stamp}:1430");
        let weekday = calendar::is_weekday(today);

        if hhmm == (1, 0) {
            if today.weekday().number_from_monday() == 1
                && self.store.train_config().post_full_on_monday
            {
                self.train_week_post(now, today);
            }
            if weekday && !self.store.has_fired(&key_morning) {
                match lineup::day_lineup(&self.store, today) {
                    Ok(day) if day.is_ready() => {
                        self.deliver(&format_train_day(&day, "today"), MentionPolicy::Safe);
                        self.mark(&key_morning, now);
                    }
                    Ok(_) if !self.store.has_fired(&key_pending) => {
                        self.deliver(
                            "Train passenger still pending; register points or run a daily draw.",
                            MentionPolicy::Safe,
                        );
                        self.mark(&key_pending, now);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("train lineup failed: {e}"),
                }
            }
        }

        // A day that started pending posts as soon as its passenger
        // appears.
        if weekday
            && !self.store.has_fired(&key_morning)
            && self.store.has_fired(&key_pending)
        {
            match lineup::day_lineup(&self.store, today) {
                Ok(day) if day.is_ready() => {
                    self.deliver(
                        &format_train_day(&day, "update, passenger now assigned"),
                        MentionPolicy::Safe,
                    );
                    self.mark(&key_morning, now);
                }
                Ok(_) => {}
                Err(e) => log::warn!("train lineup failed: {e}"),
            }
        }

        if hhmm == (14, 30) && weekday && !self.store.has_fired(&key_afternoon) {
            match lineup::day_lineup(&self.store, today) {
                Ok(day) if day.is_ready() => {
                    self.deliver(&format_train_day(&day, "reminder"), MentionPolicy::Safe);
                    self.mark(&key_afternoon, now);
                }
                Ok(_) => {}
                Err(e) => log::warn!("train lineup failed: {e}"),
            }
        }
    }

    fn train_week_post(&mut self, now: DateTime<Utc>, monday: NaiveDate) {
        let key = format!("TRAINWEEK:{}", calendar::day_stamp(monday));
        if self.store.has_fired(&key) {
            return;
        }
        match lineup::week_lineup(&self.store, monday) {
            Ok(days) => {
                let lines: Vec<String> = days
                    .iter()
                    .map(|d| {
                        format!(
                            "• {} | driver {} — passenger {}",
                            d.date.format("%a %d/%m"),
                            d.driver.as_deref().unwrap_or("Pending"),
                            d.passenger.as_deref().unwrap_or("Pending"),
                        )
                    })
                    .collect();
                let body = format!("Train — weekly lineup (Mon-Sun)\n{}", lines.join("\n"));
                self.deliver(&body, MentionPolicy::Safe);
                self.mark(&key, now);
            }
            Err(e) => log::warn!("train week lineup failed: {e}"),
        }
    }

    /// Deliver with no broadcast mention; failures are logged only.
    fn deliver(&mut self, body: &str, mention: MentionPolicy) {
        if let Err(e) = self.notifier.send(self.cfg.announce_channel, body, mention) {
            log::warn!("delivery failed: {e}");
        }
    }

    /// Deliver an urgent broadcast; on a permission rejection, degrade
    /// once to a mention-free resend.
    fn deliver_urgent(&mut self, body: &str) {
        let full = match &self.cfg.mention_urgent {
            Some(tag) => format!("{tag} {body}"),
            None => body.to_string(),
        };
        match self
            .notifier
            .send(self.cfg.announce_channel, &full, MentionPolicy::Broadcast)
        {
            Ok(()) => {}
            Err(DeliveryError::PermissionDenied) => {
                log::warn!("broadcast rejected; resending without mentions");
                self.deliver(body, MentionPolicy::Safe);
            }
            Err(e) => log::warn!("urgent delivery failed: {e}"),
        }
    }

    fn mark(&self, key: &str, now: DateTime<Utc>) {
        if let Err(e) = self.store.mark_fired(key, now) {
            log::error!("failed to persist fired mark {key}: {e}");
        }
    }
}

fn format_train_day(day: &DayLineup, title: &str) -> String {
    format!(
        "Train ({title}) — driver {}, passenger {} (backup {})",
        day.driver.as_deref().unwrap_or("Pending"),
        day.passenger.as_deref().unwrap_or("Pending"),
        day.backup.as_deref().unwrap_or("—"),
    )
}

/// Compact duration label: `1d 2h 30m`, `<1m` under a minute.
fn fmt_eta(total_seconds: i64) -> String {
    let s = total_seconds.max(0);
    let minutes = s / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let (hours, minutes) = (hours % 24, minutes % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if parts.is_empty() {
        parts.push("<1m".to_string());
    }
    parts.join(" ")
}
