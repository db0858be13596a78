//! Envelope addresses.

use crate::error::{Error, Result};
use std::fmt;

/// An address used in `MAIL FROM` / `RCPT TO`.
///
/// Only the bare `local@domain` form is accepted; display names belong in
/// the message headers, not the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Parses and validates an envelope address.
    ///
    /// Surrounding whitespace and a single pair of angle brackets are
    /// stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] when the address is empty, has no
    /// or several `@`, has an empty local or domain part, or contains
    /// whitespace or control characters.
    pub fn new(addr: impl AsRef<str>) -> Result<Self> {
        let trimmed = addr.as_ref().trim();
        let bare = trimmed
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(trimmed);

        if bare.is_empty() {
            return Err(Error::InvalidAddress("address is empty".into()));
        }
        if bare.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::InvalidAddress(format!(
                "{bare}: contains whitespace"
            )));
        }

        let Some((local, domain)) = bare.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{bare}: missing @")));
        };
        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!("{bare}: more than one @")));
        }
        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{bare}: empty local or domain part"
            )));
        }

        Ok(Self(bare.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, d)| d)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn strips_brackets_and_whitespace() {
        let addr = Address::new("  <user@example.com> ").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "userexample.com", "@example.com", "user@", "a@b@c", "a b@c.d"] {
            assert!(Address::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
