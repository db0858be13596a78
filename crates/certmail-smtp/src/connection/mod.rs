//! Connection management with a type-state client.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected, Ready};
pub use stream::{DEFAULT_IO_TIMEOUT, SmtpStream, connect, connect_tls};

use crate::types::{AuthMechanism, Extension};

/// What the server told us about itself.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// First word of the greeting, usually the server's hostname.
    pub hostname: String,
    /// Extensions from the most recent EHLO.
    pub extensions: Vec<Extension>,
}

impl ServerInfo {
    /// Checks if the server advertised an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is offered.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the advertised SASL mechanisms this client understands.
    #[must_use]
    pub fn auth_mechanisms(&self) -> &[AuthMechanism] {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechs) => Some(mechs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Returns the SIZE limit, if the server announced one.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Picks the mechanism to log in with: PLAIN when offered, LOGIN when it
    /// is the only one, PLAIN when the server listed nothing we know.
    #[must_use]
    pub fn preferred_auth(&self) -> AuthMechanism {
        let mechs = self.auth_mechanisms();
        if !mechs.contains(&AuthMechanism::Plain) && mechs.contains(&AuthMechanism::Login) {
            AuthMechanism::Login
        } else {
            AuthMechanism::Plain
        }
    }
}
