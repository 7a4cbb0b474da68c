//! Convoy Store - Durable state for the convoy engine
//!
//! Two persistence surfaces, both file-based:
//! - A single structured JSON document (schedules, train configuration,
//!   automation toggles, fired marks, points) written with
//!   load / mutate / atomic-replace semantics (`store`, `document`)
//! - Per-ISO-week append-only CSV logs for registrations and draws,
//!   named by the week's closing Sunday (`weeklog`)
//!
//! The atomic replace guarantees no torn document is ever observable,
//! but there is no cross-process locking: a single writer process is
//! assumed. Log appends are line-atomic; redo operations rewrite a
//! filtered copy through a temp file.

pub mod document;
mod error;
pub mod store;
pub mod weeklog;

pub use document::{AutoFlag, Document};
pub use error::{Error, Result};
pub use store::{Registration, Store};
pub use weeklog::{list_weeks, remove_weekly, DrawRow, RegistrationRow, WeekFiles, WeekLog};
