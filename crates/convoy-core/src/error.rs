//! Error types for convoy-core

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
///
/// Business rejections (insufficient pool, invalid day, future date) are
/// ordinary variants here so callers have to handle each case; none of
/// them mutate any state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Day key was not one of `mon`..`sat`.
    #[error("invalid day key {0:?}, expected mon..sat")]
    InvalidDayKey(String),

    /// A date or time string did not parse.
    #[error("invalid date/time: {0}")]
    InvalidFormat(String),

    /// Target day is not a Monday-Saturday event day.
    #[error("{0} is not an event day (Mon-Sat)")]
    NotVsDay(NaiveDate),

    /// Target day lies in the future.
    #[error("{0} is in the future")]
    FutureDate(NaiveDate),

    /// The rotation anchor must be a Monday.
    #[error("{0} is not a Monday")]
    NotMonday(NaiveDate),

    /// Nobody left to draw from after exclusions.
    #[error("no eligible candidates remain")]
    EmptyPool,

    /// Fewer eligible candidates than the draw requires.
    #[error("pool too small: need {need}, have {have}")]
    PoolTooSmall { need: usize, have: usize },

    /// Daily draws are never based on a game Sunday.
    #[error("daily draw cannot be based on a game Sunday")]
    SundayBase,

    /// Weekly draws run on game Sunday, or Monday as a grace window.
    #[error("weekly draw only runs on game Sunday (or Monday as grace)")]
    NotDrawDay,

    /// A required configuration section has never been set.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
