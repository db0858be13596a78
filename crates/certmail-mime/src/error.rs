//! Error types for MIME generation.

use std::path::PathBuf;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header the message cannot be sent without was never set.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// A header value contains a line break or other control character.
    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An attachment file could not be read.
    #[error("cannot read attachment {}: {source}", path.display())]
    Attachment {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
