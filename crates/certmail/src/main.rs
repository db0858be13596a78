//! `certmail` - send course certificates by email.
//!
//! Reads a roster and a certificate directory, matches them by participant
//! name and mails every participant their certificate.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use certmail_core::{
    AppConfig, CertificateIndex, DispatchEngine, FixedInterval, MessageComposer, RosterIndex,
    SmtpTransport, read_roster, render,
};
use clap::Parser;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certmail=info,certmail_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("錯誤: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    info!("Starting certmail");

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("cannot load configuration {}", args.config.display()))?;
    let inputs = args.resolve(&config)?;

    let smtp = &config.run;
    info!(
        host = %smtp.host,
        port = smtp.port,
        security = smtp.security().display_name(),
        sender = %smtp.sender_email,
        "SMTP settings"
    );

    let rows = read_roster(
        &inputs.roster,
        &config.dispatch.name_column,
        &config.dispatch.email_column,
    )?;
    let roster = RosterIndex::build(rows);
    if roster.is_empty() {
        warn!(path = %inputs.roster.display(), "Roster is empty, nothing to send");
    }

    let certificates =
        CertificateIndex::from_directory(&inputs.certificates, &config.dispatch.certificate_extension)?;
    if certificates.is_empty() {
        warn!(
            dir = %inputs.certificates.display(),
            extension = %config.dispatch.certificate_extension,
            "No certificates found"
        );
    }
    for entry in certificates.entries() {
        if roster.get(&entry.participant_name).is_none() {
            warn!(
                participant = %entry.participant_name,
                path = %entry.document_path.display(),
                "Certificate has no roster entry"
            );
        }
    }

    let mut composer = MessageComposer::new(inputs.course);
    if let Some(signature) = &config.course.signature {
        composer = composer.with_signature(signature.as_str());
    }

    let mut transport = SmtpTransport::new(smtp);
    let mut pacing = FixedInterval::new(config.dispatch.send_interval);
    let report = DispatchEngine::new(smtp, &composer)
        .run(&roster, &certificates, &mut transport, &mut pacing)
        .await?;

    println!("{}", render(&report));
    Ok(())
}
