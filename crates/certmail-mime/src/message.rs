//! Outgoing message generation.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_lines, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset, Local};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;
use std::path::Path;

/// A file carried alongside the text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Content type of the data.
    pub content_type: ContentType,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from memory.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: ContentType, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data,
        }
    }

    /// Reads an attachment from disk; the file's basename becomes the
    /// attachment name and its extension picks the content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| Error::Attachment {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(filename, ContentType::for_path(path), data))
    }
}

/// A generated message: headers plus an already encoded body.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers.
    pub headers: Headers,
    body: String,
}

impl Message {
    /// Gets a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The encoded body (everything after the blank line).
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Serializes the message for the SMTP DATA phase.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n{}", self.headers, self.body)
    }
}

/// Builds a plain-text message with at most one attachment.
///
/// Without an attachment the result is a single `text/plain` part; with one
/// it is `multipart/mixed` holding the text and the file. All content is
/// base64 encoded so the message is 7-bit clean.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    subject: Option<String>,
    text: String,
    attachment: Option<Attachment>,
    date: Option<DateTime<FixedOffset>>,
    boundary: Option<String>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From address.
    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Adds a To address.
    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Sets the subject; non-ASCII text is RFC 2047 encoded.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the UTF-8 text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the attachment, replacing any earlier one.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Fixes the Date header instead of using the current local time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Fixes the multipart boundary instead of generating a random one.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Assembles the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] without a sender or recipient, and
    /// [`Error::InvalidHeader`] if an address or the subject contains a line
    /// break.
    pub fn build(self) -> Result<Message> {
        let from = self.from.ok_or(Error::MissingHeader("From"))?;
        if self.to.is_empty() {
            return Err(Error::MissingHeader("To"));
        }

        let date = self
            .date
            .unwrap_or_else(|| Local::now().fixed_offset());

        let mut headers = Headers::new();
        headers.set("From", from.as_str())?;
        headers.set("To", self.to.join(", "))?;
        headers.set_text("Subject", self.subject.as_deref().unwrap_or_default())?;
        headers.set("Date", date.to_rfc2822())?;
        headers.set("Message-ID", message_id(&from))?;
        headers.set("MIME-Version", "1.0")?;

        let text = encode_base64_lines(self.text.as_bytes());

        let Some(attachment) = self.attachment else {
            headers.set("Content-Type", ContentType::text_plain().to_string())?;
            headers.set("Content-Transfer-Encoding", "base64")?;
            return Ok(Message {
                headers,
                body: text,
            });
        };

        let boundary = self.boundary.unwrap_or_else(random_boundary);
        headers.set(
            "Content-Type",
            ContentType::multipart_mixed(boundary.as_str()).to_string(),
        )?;

        let filename = encode_rfc2047(&attachment.filename);
        let file_type = attachment
            .content_type
            .clone()
            .with_parameter("name", filename.as_str());

        let mut body = String::new();
        body.push_str("This is a multi-part message in MIME format.\r\n");

        body.push_str(&format!("\r\n--{boundary}\r\n"));
        body.push_str(&format!("Content-Type: {}\r\n", ContentType::text_plain()));
        body.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        body.push_str(&text);

        body.push_str(&format!("\r\n--{boundary}\r\n"));
        body.push_str(&format!("Content-Type: {file_type}\r\n"));
        body.push_str("Content-Transfer-Encoding: base64\r\n");
        body.push_str(&format!(
            "Content-Disposition: attachment; filename=\"{filename}\"\r\n\r\n"
        ));
        body.push_str(&encode_base64_lines(&attachment.data));

        body.push_str(&format!("\r\n--{boundary}--\r\n"));

        Ok(Message { headers, body })
    }
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn random_boundary() -> String {
    format!("=_certmail_{}", random_token(24))
}

fn message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, d)| d.trim_end_matches('>'))
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    format!("<{}.{}@{domain}>", Local::now().timestamp_millis(), random_token(12))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::encoding::encode_base64;

    fn fixed_date() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Sat, 19 Apr 2025 10:00:00 +0800").unwrap()
    }

    #[test]
    fn text_only_message() {
        let message = MessageBuilder::new()
            .from("office@example.com")
            .to("student@example.com")
            .subject("Notice")
            .text_body("hello")
            .date(fixed_date())
            .build()
            .unwrap();

        assert_eq!(message.header("Subject"), Some("Notice"));
        assert_eq!(message.header("Date"), Some("Sat, 19 Apr 2025 10:00:00 +0800"));
        assert_eq!(message.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(message.body(), format!("{}\r\n", encode_base64(b"hello")));
        assert!(message.header("Message-ID").unwrap().ends_with("@example.com>"));
    }

    #[test]
    fn attachment_makes_multipart() {
        let pdf = Attachment::new(
            "2025Cert-王小明.pdf",
            ContentType::new("application", "pdf"),
            b"%PDF-1.4 test".to_vec(),
        );
        let message = MessageBuilder::new()
            .from("office@example.com")
            .to("student@example.com")
            .subject("「AI」課程證書寄發通知")
            .text_body("王小明 同學，您好：")
            .attach(pdf)
            .boundary("BOUNDARY")
            .date(fixed_date())
            .build()
            .unwrap();

        assert_eq!(
            message.header("Content-Type"),
            Some("multipart/mixed; boundary=BOUNDARY")
        );
        assert!(message.header("Subject").unwrap().starts_with("=?utf-8?B?"));

        let body = message.body();
        assert!(body.contains("\r\n--BOUNDARY\r\nContent-Type: text/plain; charset=utf-8\r\n"));
        assert!(body.contains(&encode_base64("王小明 同學，您好：".as_bytes())));
        assert!(body.contains("Content-Type: application/pdf; name=\"=?utf-8?B?"));
        assert!(body.contains("Content-Disposition: attachment; filename=\"=?utf-8?B?"));
        assert!(body.contains(&encode_base64(b"%PDF-1.4 test")));
        assert!(body.ends_with("\r\n--BOUNDARY--\r\n"));
    }

    #[test]
    fn serialized_form_separates_headers_and_body() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .to("b@example.com")
            .text_body("x")
            .build()
            .unwrap();
        let wire = String::from_utf8(message.to_bytes()).unwrap();
        let (head, body) = wire.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("From: a@example.com\r\nTo: b@example.com\r\n"));
        assert_eq!(body, message.body());
    }

    #[test]
    fn missing_sender_or_recipient() {
        assert!(matches!(
            MessageBuilder::new().to("b@example.com").build(),
            Err(Error::MissingHeader("From"))
        ));
        assert!(matches!(
            MessageBuilder::new().from("a@example.com").build(),
            Err(Error::MissingHeader("To"))
        ));
    }

    #[test]
    fn attachment_from_file_uses_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("證書-王小明.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let attachment = Attachment::from_file(&path).unwrap();
        assert_eq!(attachment.filename, "證書-王小明.pdf");
        assert_eq!(attachment.content_type.essence(), "application/pdf");
        assert_eq!(attachment.data, b"%PDF");
    }

    #[test]
    fn missing_attachment_file_is_an_error() {
        let err = Attachment::from_file(Path::new("/nonexistent/cert.pdf")).unwrap_err();
        assert!(matches!(err, Error::Attachment { .. }));
    }
}
