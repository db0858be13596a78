//! Ordered header block.

use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use std::fmt;

/// Headers in insertion order, as they will appear on the wire.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing an existing one with the same name
    /// (case-insensitive) in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is not a valid field name
    /// or the value contains CR or LF.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate(&name, &value)?;
        self.set_unchecked(name, value);
        Ok(())
    }

    /// Sets a header whose value may contain non-ASCII text, applying
    /// RFC 2047 encoding as needed.
    ///
    /// # Errors
    ///
    /// Same as [`Headers::set`].
    pub fn set_text(&mut self, name: impl Into<String>, text: &str) -> Result<()> {
        let name = name.into();
        validate(&name, text)?;
        self.set_unchecked(name, encode_rfc2047(text));
        Ok(())
    }

    fn set_unchecked(&mut self, name: String, value: String) {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Gets a header value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over headers in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return Err(Error::InvalidHeader {
            name: name.to_string(),
            reason: "not a valid field name".into(),
        });
    }
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeader {
            name: name.to_string(),
            reason: "value contains a line break".into(),
        });
    }
    Ok(())
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
