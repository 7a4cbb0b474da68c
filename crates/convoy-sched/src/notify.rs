//! Notification delivery contract
//!
//! The firer hands plain text to a [`Notifier`] supplied by the embedding
//! layer; rendering richer than field interpolation and the chat wire
//! protocol both live outside this crate. Delivery is at-most-once: a
//! failed urgent broadcast degrades to a single mention-free resend and
//! is never retried past its fired mark.

use thiserror::Error;

/// How a message may mention the channel audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionPolicy {
    /// No broadcast mentions.
    Safe,
    /// Channel-wide mention allowed (urgent reminders).
    Broadcast,
}

/// Delivery failure reported by the embedding layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The notifier lacks permission for the requested mention policy.
    #[error("permission denied")]
    PermissionDenied,
    /// Any other delivery failure.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Outbound delivery function implemented by the embedding layer.
pub trait Notifier {
    fn send(
        &mut self,
        channel: u64,
        body: &str,
        mention: MentionPolicy,
    ) -> Result<(), DeliveryError>;
}
