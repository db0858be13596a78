//! Error types for the dispatch pipeline.
//!
//! Only failures that stop a run before the first send live here.
//! Per-contact problems are recorded as outcomes in the report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while preparing a run.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings are missing or contradictory.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No configuration file existed, so a template was written.
    #[error(
        "Configuration file {} did not exist; a template was created, edit it and run again",
        .0.display()
    )]
    ConfigCreated(PathBuf),

    /// The configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    /// The roster or the certificate directory could not be read.
    #[error("Cannot load {what} from {}: {reason}", path.display())]
    Load {
        /// Which input failed ("roster", "certificate directory").
        what: &'static str,
        /// Where it was read from.
        path: PathBuf,
        /// Why it failed.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true for configuration problems.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ConfigCreated(_) | Self::ConfigSource(_)
        )
    }

    /// Returns true for roster or directory loading problems.
    #[must_use]
    pub const fn is_load(&self) -> bool {
        matches!(self, Self::Load { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
