//! Command serialization.

use crate::types::{Address, AuthMechanism};

/// A client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO with the client's name.
    Ehlo {
        /// Name announced to the server.
        hostname: String,
    },
    /// STARTTLS
    StartTls,
    /// AUTH, optionally with an initial response (SASL-IR).
    Auth {
        /// Mechanism to use.
        mechanism: AuthMechanism,
        /// Base64 initial response.
        initial_response: Option<String>,
    },
    /// A bare base64 line answering a 334 challenge.
    AuthResponse(String),
    /// MAIL FROM
    MailFrom {
        /// Reverse path.
        from: Address,
    },
    /// RCPT TO
    RcptTo {
        /// Forward path.
        to: Address,
    },
    /// DATA
    Data,
    /// RSET
    Rset,
    /// QUIT
    Quit,
}

impl Command {
    /// Serializes the command, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response: Some(resp),
            } => format!("AUTH {} {resp}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()),
            Self::AuthResponse(resp) => resp.clone(),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Rset => "RSET".to_string(),
            Self::Quit => "QUIT".to_string(),
        };

        let mut buf = line.into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns true if the serialized form carries credentials and must not
    /// be logged.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::AuthResponse(_))
    }
}

/// Prepares a message body for the DATA phase.
///
/// Line endings are normalized to CRLF, lines starting with `.` are
/// dot-stuffed, and the terminating `.` line is appended.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 64);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_commands() {
        let from = Address::new("sender@example.com").unwrap();
        let to = Address::new("rcpt@example.com").unwrap();
        assert_eq!(
            Command::MailFrom { from }.serialize(),
            b"MAIL FROM:<sender@example.com>\r\n"
        );
        assert_eq!(
            Command::RcptTo { to }.serialize(),
            b"RCPT TO:<rcpt@example.com>\r\n"
        );
    }

    #[test]
    fn auth_commands() {
        let plain = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".into()),
        };
        assert_eq!(plain.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert!(plain.is_sensitive());

        let login = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        assert_eq!(login.serialize(), b"AUTH LOGIN\r\n");
        assert_eq!(Command::AuthResponse("dXNlcg==".into()).serialize(), b"dXNlcg==\r\n");
        assert!(!Command::Quit.is_sensitive());
    }

    #[test]
    fn simple_verbs() {
        assert_eq!(Command::Ehlo { hostname: "localhost".into() }.serialize(), b"EHLO localhost\r\n");
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Rset.serialize(), b"RSET\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn data_normalizes_and_stuffs() {
        let encoded = encode_data(b"Subject: x\n\n.hidden\r\nlast");
        assert_eq!(encoded, b"Subject: x\r\n\r\n..hidden\r\nlast\r\n.\r\n");
    }

    #[test]
    fn data_trailing_newline_not_doubled() {
        assert_eq!(encode_data(b"body\r\n"), b"body\r\n.\r\n");
        assert_eq!(encode_data(b""), b".\r\n");
    }
}
