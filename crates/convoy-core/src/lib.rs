//! Convoy Core - Game-calendar scheduling and ledger domain logic
//!
//! This crate provides the pure domain layer for the convoy automation
//! engine:
//! - Game-calendar arithmetic with a configurable day cutover (`calendar`)
//! - Recurring event schedules and occurrence computation (`schedule`)
//! - Constrained-random draws for passengers and drivers (`draw`)
//! - Weekly points math with fuzzy name reconciliation (`points`, `names`)
//! - The two-week driver rotation (`rotation`)
//! - Draw records and their legacy wire codec (`record`)
//!
//! Everything here is deterministic over its inputs: dates come from the
//! caller, randomness comes from an explicitly seeded [`DrawRng`], and
//! nothing touches the filesystem. Persistence lives in `convoy-store`,
//! time-driven orchestration in `convoy-sched`.

pub mod calendar;
pub mod draw;
mod error;
pub mod names;
pub mod points;
pub mod record;
pub mod rng;
pub mod rotation;
pub mod schedule;

pub use calendar::GameCalendar;
pub use error::{Error, Result};
pub use points::{PointsEntry, WeekPoints, WeeklySummary};
pub use record::DrawRecord;
pub use rng::DrawRng;
pub use rotation::TrainConfig;
pub use schedule::{EventKind, EventSchedule, Occurrence};
