//! # certmail-smtp
//!
//! Async SMTP submission client (RFC 5321) used to deliver certificate
//! notices.
//!
//! ## Features
//!
//! - **Type-state sessions**: greeting, EHLO, optional STARTTLS, login and
//!   mail transactions are enforced by the type system
//! - **TLS**: implicit TLS (SMTPS, port 465) and STARTTLS (RFC 3207)
//! - **Authentication**: AUTH PLAIN and AUTH LOGIN
//! - **Session reuse**: several messages can be sent after one login
//! - **Timeouts**: connect, handshake and every read or write are bounded
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use certmail_smtp::{Address, Client};
//! use certmail_smtp::connection::connect;
//!
//! let stream = connect("smtp.example.com", 587, Duration::from_secs(30))
//!     .await?
//!     .with_io_timeout(Duration::from_secs(60));
//! let client = Client::greet(stream).await?.ehlo("localhost").await?;
//! let client = client.starttls("smtp.example.com", "localhost").await?;
//! let mut client = client.authenticate("user", "secret").await?;
//!
//! let from = Address::new("sender@example.com")?;
//! let to = [Address::new("student@example.com")?];
//! client.send_mail(&from, &to, b"Subject: Hi\r\n\r\nHello\r\n").await?;
//! client.quit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{Authenticated, Client, Connected, Ready, ServerInfo, SmtpStream};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
