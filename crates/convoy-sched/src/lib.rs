//! Convoy Sched - Timed orchestration for the convoy engine
//!
//! The pieces that turn the pure domain (`convoy-core`) and the durable
//! state (`convoy-store`) into a running automation:
//! - [`Firer`]: the once-a-minute evaluation pass behind every reminder,
//!   automatic draw, weekly digest and train post, idempotent across
//!   restarts through persisted fired marks
//! - [`Clock`]: injectable time source, so tests advance virtual time
//!   minute by minute instead of sleeping
//! - [`Notifier`]: the outbound delivery contract; rendering and the
//!   chat wire protocol stay in the embedding layer
//! - `service`: command-facing operations (draws, redo, scheduling)
//!   shared with the firer's automatic paths
//! - `lineup`: train lineup resolution from rotation plus draw logs

pub mod clock;
pub mod config;
mod error;
pub mod firer;
pub mod lineup;
pub mod notify;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use firer::Firer;
pub use lineup::DayLineup;
pub use notify::{DeliveryError, MentionPolicy, Notifier};
