//! Error types for SMTP submission.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or configuration error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The server rejected a command.
    #[error("server replied {code}: {message}")]
    Rejected {
        /// Reply code (e.g., 535).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server sent something that is not a well-formed reply.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer closed the connection mid-reply.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Connecting, or waiting on the server, took longer than the
    /// configured limit.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Invalid envelope address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// The server does not offer a required feature.
    #[error("server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates a rejection error from a reply code and its text.
    #[must_use]
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the server rejected permanently (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if the server rejected transiently (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}
