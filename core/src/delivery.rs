//! Delivery seam: the core hands rendered text to a [`Publisher`] and
//! never learns what transport sits behind it.
//!
//! Delivery is best effort. Callers log a failed publish and carry on;
//! a report run never fails because the channel was unreachable.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("delivery to channel '{channel_id}' failed: {reason}")]
    Failed { channel_id: String, reason: String },
}

pub trait Publisher {
    /// Push `text` to `channel_id`. `rich_text` requests HTML formatting.
    fn publish(&self, channel_id: &str, text: &str, rich_text: bool) -> Result<(), DeliveryError>;
}

/// Default publisher: writes the message to the log. Used by the headless
/// runner and as a stand-in wherever no real transport is wired up.
pub struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish(&self, channel_id: &str, text: &str, _rich_text: bool) -> Result<(), DeliveryError> {
        log::info!("[{channel_id}]\n{text}");
        Ok(())
    }
}
