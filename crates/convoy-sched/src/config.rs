//! Runtime configuration
//!
//! Plain struct with defaults; every field can be overridden through the
//! environment variables the deployment already uses.

use convoy_core::calendar::DEFAULT_CUTOVER_HOUR;
use std::env;
use std::path::PathBuf;

/// Default per-day eligibility threshold (7.2M points).
pub const DEFAULT_THRESHOLD: i64 = 7_200_000;

/// Default quiet window before an automatic draw runs, in minutes.
pub const DEFAULT_QUIET_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the document store and weekly logs.
    pub data_dir: PathBuf,
    /// Channel the firer delivers notifications to.
    pub announce_channel: u64,
    /// Master switch for the whole firer.
    pub announce_enabled: bool,
    /// Per-day eligibility threshold.
    pub threshold: i64,
    /// Game-day cutover hour (UTC).
    pub cutover_hour: u32,
    /// Automation defaults; the store may override each at runtime.
    pub auto_draw_daily: bool,
    pub auto_draw_weekly: bool,
    pub auto_vs_reminder: bool,
    pub auto_train_post: bool,
    /// Extra mention tag prepended to urgent broadcasts.
    pub mention_urgent: Option<String>,
    /// Minimum minutes without a store write before automatic draws run.
    pub quiet_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            announce_channel: 0,
            announce_enabled: true,
            threshold: DEFAULT_THRESHOLD,
            cutover_hour: DEFAULT_CUTOVER_HOUR,
            auto_draw_daily: true,
            auto_draw_weekly: true,
            auto_vs_reminder: true,
            auto_train_post: true,
            mention_urgent: None,
            quiet_minutes: DEFAULT_QUIET_MINUTES,
        }
    }
}

impl Config {
    /// Build from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            data_dir: env::var("DATA_DIR").map(PathBuf::from).unwrap_or(d.data_dir),
            announce_channel: env_parse("ANNOUNCE_CHANNEL_ID", d.announce_channel),
            announce_enabled: env_bool("ANNOUNCE_ENABLED", d.announce_enabled),
            threshold: env_parse("THRESHOLD", d.threshold),
            cutover_hour: env_parse("GAME_CUTOVER_UTC", d.cutover_hour),
            auto_draw_daily: env_bool("AUTO_DRAW_D", d.auto_draw_daily),
            auto_draw_weekly: env_bool("AUTO_DRAW_W", d.auto_draw_weekly),
            auto_vs_reminder: env_bool("AUTO_VS_REMINDER", d.auto_vs_reminder),
            auto_train_post: env_bool("AUTO_TRAIN_POST", d.auto_train_post),
            mention_urgent: env::var("MENTION_URGENT").ok().filter(|s| !s.is_empty()),
            quiet_minutes: env_parse("INGEST_QUIET_MINUTES", d.quiet_minutes),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => v.trim().eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.threshold, 7_200_000);
        assert_eq!(cfg.cutover_hour, 2);
        assert_eq!(cfg.quiet_minutes, 5);
        assert!(cfg.auto_draw_daily);
        assert!(cfg.mention_urgent.is_none());
    }
}
