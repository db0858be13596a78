//! Command line arguments.

use anyhow::{Context, Result};
use certmail_core::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// Send course certificates to every participant on a roster.
#[derive(Debug, Parser)]
#[command(name = "certmail", version, about)]
pub struct Args {
    /// Configuration file; a template is written if it does not exist.
    #[arg(short, long, default_value = "config.ini")]
    pub config: PathBuf,

    /// Roster workbook (.xlsx) or CSV file (overrides `[COURSE] contacts_file`).
    #[arg(short, long)]
    pub roster: Option<PathBuf>,

    /// Certificate directory (overrides `[COURSE] certificate_dir`).
    #[arg(long)]
    pub certificates: Option<PathBuf>,

    /// Course name (overrides `[COURSE] name`).
    #[arg(long)]
    pub course: Option<String>,
}

/// Inputs of a run after flags and configuration are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub course: String,
    pub roster: PathBuf,
    pub certificates: PathBuf,
}

impl Args {
    /// Merges flags over the `[COURSE]` section; flags win.
    pub fn resolve(&self, config: &AppConfig) -> Result<Inputs> {
        let course = self
            .course
            .clone()
            .or_else(|| config.course.name.clone())
            .context("no course name: pass --course or set [COURSE] name")?;
        let roster = self
            .roster
            .clone()
            .or_else(|| config.course.contacts_file.clone())
            .context("no roster: pass --roster or set [COURSE] contacts_file")?;
        let certificates = self
            .certificates
            .clone()
            .or_else(|| config.course.certificate_dir.clone())
            .context("no certificate directory: pass --certificates or set [COURSE] certificate_dir")?;

        Ok(Inputs {
            course,
            roster,
            certificates,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
[SMTP]
server = smtp.example.com
port = 465
username = u
password = p
sender_email = office@example.com

[COURSE]
name = AI Studio
contacts_file = roster.csv
";

    #[test]
    fn config_fills_missing_flags() {
        let config = AppConfig::from_ini(CONFIG).unwrap();
        let args = Args::try_parse_from(["certmail", "--certificates", "certs"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.ini"));

        let inputs = args.resolve(&config).unwrap();
        assert_eq!(
            inputs,
            Inputs {
                course: "AI Studio".into(),
                roster: PathBuf::from("roster.csv"),
                certificates: PathBuf::from("certs"),
            }
        );
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig::from_ini(CONFIG).unwrap();
        let args = Args::try_parse_from([
            "certmail",
            "-c",
            "other.ini",
            "--roster",
            "b.csv",
            "--certificates",
            "out",
            "--course",
            "Rust 101",
        ])
        .unwrap();

        let inputs = args.resolve(&config).unwrap();
        assert_eq!(inputs.course, "Rust 101");
        assert_eq!(inputs.roster, PathBuf::from("b.csv"));
        assert_eq!(args.config, PathBuf::from("other.ini"));
    }

    #[test]
    fn missing_input_is_an_error() {
        let config = AppConfig::from_ini(CONFIG).unwrap();
        let args = Args::try_parse_from(["certmail"]).unwrap();
        let err = args.resolve(&config).unwrap_err();
        assert!(err.to_string().contains("certificate directory"));
    }
}
