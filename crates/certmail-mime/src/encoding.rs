//! Transfer and header encodings used when generating messages.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum body line length for base64 content (RFC 2045).
const BASE64_LINE_LENGTH: usize = 76;

/// Longest encoded word allowed by RFC 2047, `=?` through `?=`.
const MAX_ENCODED_WORD: usize = 75;

/// Encodes data as base64 without line breaks.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as base64 broken into CRLF-terminated lines of at most 76
/// characters, ready to be placed in a MIME part body.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2 + 2);
    // base64 output is ASCII, so byte chunks are valid str boundaries
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

/// Returns true if `text` can go into a header verbatim.
#[must_use]
pub fn is_plain_header_text(text: &str) -> bool {
    text.chars()
        .all(|c| (c.is_ascii_graphic() || c == ' ') && c != '=' && c != '?')
        && !text.contains("=?")
}

/// Encodes a header value as RFC 2047 base64 encoded words when it is not
/// plain ASCII.
///
/// Long values are split into several encoded words separated by folding
/// whitespace (`CRLF SP`), each word at most 75 characters and never
/// splitting a UTF-8 sequence.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    const PREFIX: &str = "=?utf-8?B?";
    const SUFFIX: &str = "?=";

    if is_plain_header_text(text) {
        return text.to_string();
    }

    // Every 3 input bytes become 4 output characters
    let max_bytes = (MAX_ENCODED_WORD - PREFIX.len() - SUFFIX.len()) / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > max_bytes {
            words.push(format!("{PREFIX}{}{SUFFIX}", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("{PREFIX}{}{SUFFIX}", encode_base64(chunk.as_bytes())));
    }

    words.join("\r\n ")
}
