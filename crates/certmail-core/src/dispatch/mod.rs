//! The dispatch loop.
//!
//! Contacts are handled one at a time in roster order. Each one ends in
//! exactly one [`DispatchOutcome`]: skipped when it cannot be matched,
//! otherwise sent or failed depending on the transport.

mod pacing;
mod report;

pub use pacing::{FixedInterval, NoDelay, Pacing};
pub use report::{DispatchOutcome, DispatchReport, SkipReason, render};

use crate::certificates::CertificateIndex;
use crate::compose::MessageComposer;
use crate::config::RunConfig;
use crate::error::Result;
use crate::roster::{Contact, RosterIndex};
use crate::service::{OutgoingMessage, Transport};
use tracing::{info, warn};

/// Runs a batch over a roster.
#[derive(Debug, Clone, Copy)]
pub struct DispatchEngine<'a> {
    config: &'a RunConfig,
    composer: &'a MessageComposer,
}

impl<'a> DispatchEngine<'a> {
    /// Creates an engine for one configuration and notice.
    #[must_use]
    pub const fn new(config: &'a RunConfig, composer: &'a MessageComposer) -> Self {
        Self { config, composer }
    }

    /// Processes every roster entry and returns the tally.
    ///
    /// Per-contact problems never abort the run; they are recorded in the
    /// report.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, before anything is sent, when test
    /// mode is on without a test recipient.
    pub async fn run<T, P>(
        &self,
        roster: &RosterIndex,
        certificates: &CertificateIndex,
        transport: &mut T,
        pacing: &mut P,
    ) -> Result<DispatchReport>
    where
        T: Transport,
        P: Pacing,
    {
        let test_recipient = self.config.effective_test_recipient()?;
        if let Some(recipient) = test_recipient {
            warn!(recipient, "Test mode: every message goes to the test recipient");
        }

        info!(
            contacts = roster.len(),
            certificates = certificates.len(),
            course = self.composer.course_name(),
            "Starting dispatch"
        );

        let mut report = DispatchReport::new();
        for contact in roster {
            let outcome = self
                .dispatch_one(contact, certificates, test_recipient, transport, pacing)
                .await;
            log_outcome(contact, &outcome);
            report.record(contact, outcome);
        }

        info!(
            sent = report.sent(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Dispatch finished"
        );
        Ok(report)
    }

    async fn dispatch_one<T, P>(
        &self,
        contact: &Contact,
        certificates: &CertificateIndex,
        test_recipient: Option<&str>,
        transport: &mut T,
        pacing: &mut P,
    ) -> DispatchOutcome
    where
        T: Transport,
        P: Pacing,
    {
        if !contact.is_complete() {
            return DispatchOutcome::Skipped {
                reason: SkipReason::MissingField,
            };
        }
        let Some(certificate) = certificates.get(&contact.name) else {
            return DispatchOutcome::Skipped {
                reason: SkipReason::NoCertificate,
            };
        };

        let recipient = test_recipient.unwrap_or(contact.email.as_str()).to_string();
        let test_mode = test_recipient.is_some();
        let message = OutgoingMessage::new(
            self.config.sender_email.as_str(),
            recipient.as_str(),
            self.composer.build_subject(test_mode),
            self.composer
                .build_body(&contact.name, test_mode, test_recipient),
        )
        .attach(certificate);

        pacing.wait_turn().await;
        let result = transport.send(&message).await;
        pacing.record_attempt();

        match result {
            Ok(()) => DispatchOutcome::Sent { recipient },
            Err(e) => DispatchOutcome::Failed {
                recipient,
                reason: e.to_string(),
            },
        }
    }
}

fn log_outcome(contact: &Contact, outcome: &DispatchOutcome) {
    let row = contact.row;
    let name = contact.name.as_str();
    match outcome {
        DispatchOutcome::Sent { recipient } => {
            info!(row, name, recipient = %recipient, "Sent");
        }
        DispatchOutcome::Failed { recipient, reason } => {
            warn!(row, name, recipient = %recipient, reason = %reason, "Send failed");
        }
        DispatchOutcome::Skipped { reason } => {
            warn!(row, name, email = %contact.email, reason = %reason, "Skipped");
        }
    }
}
