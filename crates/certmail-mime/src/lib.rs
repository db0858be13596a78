//! # certmail-mime
//!
//! MIME generation for outgoing notices: a UTF-8 text body with an optional
//! file attachment.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::path::Path;
//! use certmail_mime::{Attachment, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .from("office@example.com")
//!     .to("student@example.com")
//!     .subject("「AI Studio」課程證書寄發通知")
//!     .text_body("王小明 同學，您好：")
//!     .attach(Attachment::from_file(Path::new("certs/2025Cert-王小明.pdf"))?)
//!     .build()?;
//!
//! let wire: Vec<u8> = message.to_bytes();
//! ```
//!
//! Non-ASCII header values are RFC 2047 encoded and every body part is
//! base64, so the output can travel over any SMTP server.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Attachment, Message, MessageBuilder};
