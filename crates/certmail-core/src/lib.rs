//! # certmail-core
//!
//! Certificate dispatch pipeline for `certmail`.
//!
//! This crate provides:
//! - Run configuration loaded from an INI file
//! - Roster reading and the name index
//! - Certificate directory indexing
//! - Notice composition
//! - The paced dispatch loop and its report
//! - **SMTP delivery** over `certmail-smtp` and `certmail-mime`
//!
//! ## Example
//!
//! ```ignore
//! use certmail_core::{
//!     AppConfig, CertificateIndex, DispatchEngine, FixedInterval, MessageComposer,
//!     RosterIndex, SmtpTransport, read_roster, render,
//! };
//!
//! let config = AppConfig::load("config.ini".as_ref())?;
//! let roster = RosterIndex::build(read_roster("roster.xlsx".as_ref(), "姓名", "電子郵件")?);
//! let certificates = CertificateIndex::from_directory("certs".as_ref(), ".pdf")?;
//! let composer = MessageComposer::new("AI Studio");
//!
//! let engine = DispatchEngine::new(&config.run, &composer);
//! let mut transport = SmtpTransport::new(&config.run);
//! let mut pacing = FixedInterval::new(config.dispatch.send_interval);
//! let report = engine.run(&roster, &certificates, &mut transport, &mut pacing).await?;
//! println!("{}", render(&report));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod certificates;
pub mod compose;
pub mod config;
pub mod dispatch;
mod error;
pub mod roster;
pub mod service;

pub use certificates::{CertificateEntry, CertificateIndex, list_directory, participant_name};
pub use compose::MessageComposer;
pub use config::{AppConfig, CourseSettings, DispatchSettings, RunConfig, Security};
pub use dispatch::{
    DispatchEngine, DispatchOutcome, DispatchReport, FixedInterval, NoDelay, Pacing, SkipReason,
    render,
};
pub use error::{Error, Result};
pub use roster::{Contact, RosterError, RosterIndex, RosterRow, parse_csv, read_roster};
pub use service::{
    OutgoingMessage, SmtpSettings, SmtpTransport, Transport, TransportError, send_email,
};
