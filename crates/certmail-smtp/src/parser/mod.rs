//! Reply parser.
//!
//! Replies are one or more lines sharing a three-digit code. Every line but
//! the last separates code and text with `-`; the last uses a space (or ends
//! right after the code):
//!
//! ```text
//! 250-smtp.example.com greets client
//! 250-AUTH PLAIN LOGIN
//! 250 STARTTLS
//! ```

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// One parsed line of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// The line's reply code.
    pub code: ReplyCode,
    /// Whether this line terminates the reply.
    pub last: bool,
    /// Text after the separator.
    pub text: String,
}

/// Parses a single reply line (without the trailing CRLF).
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the line does not start with three digits
/// followed by `-`, a space, or end of line.
pub fn parse_line(line: &str) -> Result<ReplyLine> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(Error::Protocol(format!("malformed reply line: {line:?}")));
    }

    let code = line[..3]
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("invalid reply code: {line:?}")))?;

    let (last, text) = match bytes.get(3) {
        None => (true, ""),
        Some(b' ') => (true, &line[4..]),
        Some(b'-') => (false, &line[4..]),
        Some(_) => {
            return Err(Error::Protocol(format!("bad reply separator: {line:?}")));
        }
    };

    Ok(ReplyLine {
        code: ReplyCode::new(code),
        last,
        text: text.to_string(),
    })
}

/// Assembles a reply from its parsed lines.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if there are no lines or the lines disagree
/// on the reply code.
pub fn assemble(lines: Vec<ReplyLine>) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("empty reply".into()));
    };
    let code = first.code;

    if let Some(odd) = lines.iter().find(|l| l.code != code) {
        return Err(Error::Protocol(format!(
            "reply code changed mid-reply: {code} then {}",
            odd.code
        )));
    }

    Ok(Reply::new(code, lines.into_iter().map(|l| l.text).collect()))
}

/// Parses a complete reply from raw lines.
///
/// # Errors
///
/// Returns an error if any line is malformed or the codes disagree.
pub fn parse_reply<S: AsRef<str>>(lines: &[S]) -> Result<Reply> {
    let parsed = lines
        .iter()
        .map(|l| parse_line(l.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    assemble(parsed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let reply = parse_reply(&["250 2.0.0 Ok: queued as 4F1"]).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["2.0.0 Ok: queued as 4F1"]);
    }

    #[test]
    fn multi_line_ehlo() {
        let reply = parse_reply(&[
            "250-mail.example.org",
            "250-AUTH LOGIN PLAIN",
            "250 STARTTLS",
        ])
        .unwrap();
        assert_eq!(reply.lines.len(), 3);
        assert_eq!(reply.lines[1], "AUTH LOGIN PLAIN");
    }

    #[test]
    fn bare_code_is_last_line() {
        let line = parse_line("354").unwrap();
        assert!(line.last);
        assert_eq!(line.text, "");
    }

    #[test]
    fn continuation_flag() {
        assert!(!parse_line("250-PIPELINING").unwrap().last);
        assert!(parse_line("250 PIPELINING").unwrap().last);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_line("25").is_err());
        assert!(parse_line("ABC OK").is_err());
        assert!(parse_line("250_OK").is_err());
        assert!(parse_reply::<&str>(&[]).is_err());
    }

    #[test]
    fn rejects_mixed_codes() {
        assert!(parse_reply(&["250-first", "251 second"]).is_err());
    }
}
