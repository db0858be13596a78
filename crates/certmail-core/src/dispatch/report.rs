//! Outcome bookkeeping and the final summary.

use crate::roster::Contact;
use std::fmt::{self, Write};

/// Why a contact was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name or email cell is blank.
    MissingField,
    /// No certificate carries the contact's name.
    NoCertificate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingField => "empty name or email",
            Self::NoCertificate => "no matching certificate",
        })
    }
}

/// What happened to one roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The server accepted the message.
    Sent {
        /// Address the message went to.
        recipient: String,
    },
    /// The transport reported an error.
    Failed {
        /// Address the message was meant for.
        recipient: String,
        /// Transport error text.
        reason: String,
    },
    /// Not attempted.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
}

/// Tally of a run.
///
/// Outcomes are appended in processing order and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    outcomes: Vec<(Contact, DispatchOutcome)>,
    sent_details: Vec<String>,
    failed_details: Vec<String>,
    skipped_details: Vec<String>,
}

impl DispatchReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the outcome for `contact`.
    pub fn record(&mut self, contact: &Contact, outcome: DispatchOutcome) {
        let who = format!("第 {} 行 {}", contact.row, contact.display());
        match &outcome {
            DispatchOutcome::Sent { recipient } => {
                self.sent_details.push(format!("{who} -> {recipient}"));
            }
            DispatchOutcome::Failed { recipient, reason } => {
                self.failed_details
                    .push(format!("{who} -> {recipient}：{reason}"));
            }
            DispatchOutcome::Skipped { reason } => {
                self.skipped_details.push(format!("{who}：{reason}"));
            }
        }
        self.outcomes.push((contact.clone(), outcome));
    }

    /// Number of accepted messages.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.sent_details.len()
    }

    /// Number of transport failures.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed_details.len()
    }

    /// Number of skipped contacts.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped_details.len()
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Outcomes with their contacts, in processing order.
    #[must_use]
    pub fn outcomes(&self) -> &[(Contact, DispatchOutcome)] {
        &self.outcomes
    }

    /// Detail lines for sent messages.
    #[must_use]
    pub fn sent_details(&self) -> &[String] {
        &self.sent_details
    }

    /// Detail lines for failures.
    #[must_use]
    pub fn failed_details(&self) -> &[String] {
        &self.failed_details
    }

    /// Detail lines for skips.
    #[must_use]
    pub fn skipped_details(&self) -> &[String] {
        &self.skipped_details
    }
}

/// Renders the summary printed at the end of a run.
#[must_use]
pub fn render(report: &DispatchReport) -> String {
    let mut out = format!(
        "完成：成功 {} / 失敗 {} / 跳過 {}\n",
        report.sent(),
        report.failed(),
        report.skipped()
    );

    for (heading, lines) in [
        ("成功寄送", report.sent_details()),
        ("寄送失敗", report.failed_details()),
        ("略過記錄", report.skipped_details()),
    ] {
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{heading}：");
        for line in lines {
            let _ = writeln!(out, "  - {line}");
        }
    }
    out
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}
