//! Mail delivery.
//!
//! The dispatch loop only sees the [`Transport`] trait; [`SmtpTransport`]
//! is the production implementation.

pub mod smtp;

pub use smtp::{OutgoingMessage, SmtpSettings, SmtpTransport, TransportError, send_email};

/// Delivers one composed message.
///
/// Implementations report every failure as a [`TransportError`]; the caller
/// records it and moves on to the next recipient.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends `message`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the message was not accepted.
    async fn send(&mut self, message: &OutgoingMessage) -> Result<(), TransportError>;
}
