//! Run configuration.
//!
//! Settings come from an INI file with an `SMTP` section, an optional `TEST`
//! section and the optional `COURSE` and `DISPATCH` sections. The file is
//! read with the `config` crate and validated into [`AppConfig`].

use crate::error::{Error, Result};
use ::config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default pause between two send attempts, in seconds.
pub const DEFAULT_SEND_INTERVAL_SECS: u64 = 2;

/// Default extension of certificate files.
pub const DEFAULT_CERTIFICATE_EXTENSION: &str = ".pdf";

/// Default roster header label for the participant name.
pub const DEFAULT_NAME_COLUMN: &str = "姓名";

/// Default roster header label for the email address.
pub const DEFAULT_EMAIL_COLUMN: &str = "電子郵件";

const DEFAULT_CONFIG: &str = "\
[SMTP]
server = smtp.example.com
port = 465
username = your_email@example.com
password = your_password_or_app_password
sender_email = your_email@example.com
use_tls = false

[TEST]
enable_test_mode = true
recipient_email = test_recipient@example.com

[COURSE]
name = 課程名稱
contacts_file = contacts.xlsx
certificate_dir = certificates
signature =

[DISPATCH]
send_interval_secs = 2
certificate_extension = .pdf
name_column = 姓名
email_column = 電子郵件
";

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Maps the `use_tls` flag: `true` selects STARTTLS, `false` implicit TLS.
    #[must_use]
    pub const fn from_use_tls(use_tls: bool) -> Self {
        if use_tls { Self::StartTls } else { Self::Tls }
    }

    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// Resolved settings for one dispatch run.
#[derive(Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
    /// Envelope and header sender.
    pub sender_email: String,
    /// `true` for STARTTLS, `false` for implicit TLS.
    pub use_tls: bool,
    /// Redirect every message to `test_recipient`.
    pub test_mode: bool,
    /// Recipient used in test mode.
    pub test_recipient: Option<String>,
}

impl RunConfig {
    /// Security mode implied by `use_tls`.
    #[must_use]
    pub const fn security(&self) -> Security {
        Security::from_use_tls(self.use_tls)
    }

    /// The address every message goes to in test mode, `None` outside it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when test mode is on without a recipient.
    pub fn effective_test_recipient(&self) -> Result<Option<&str>> {
        if !self.test_mode {
            return Ok(None);
        }
        self.test_recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(Some)
            .ok_or_else(|| {
                Error::Config("test mode is enabled but [TEST] recipient_email is empty".into())
            })
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender_email", &self.sender_email)
            .field("use_tls", &self.use_tls)
            .field("test_mode", &self.test_mode)
            .field("test_recipient", &self.test_recipient)
            .finish()
    }
}

/// Where the inputs of a run live and how the notice is signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseSettings {
    /// Course name used in subject and body.
    pub name: Option<String>,
    /// Roster workbook or CSV file.
    pub contacts_file: Option<PathBuf>,
    /// Directory holding the certificates.
    pub certificate_dir: Option<PathBuf>,
    /// Signature block appended to the body.
    pub signature: Option<String>,
}

/// Tuning of the dispatch loop and of input parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Minimum pause between two send attempts.
    pub send_interval: Duration,
    /// Certificate file extension, including the leading dot.
    pub certificate_extension: String,
    /// Roster header label of the name column.
    pub name_column: String,
    /// Roster header label of the email column.
    pub email_column: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_secs(DEFAULT_SEND_INTERVAL_SECS),
            certificate_extension: DEFAULT_CERTIFICATE_EXTENSION.to_string(),
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            email_column: DEFAULT_EMAIL_COLUMN.to_string(),
        }
    }
}

/// Everything read from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Transport and test-mode settings.
    pub run: RunConfig,
    /// Input locations and signature.
    pub course: CourseSettings,
    /// Loop pacing and parsing options.
    pub dispatch: DispatchSettings,
}

impl AppConfig {
    /// Loads the configuration file at `path`.
    ///
    /// A missing file is replaced by a template and reported as
    /// [`Error::ConfigCreated`] so the operator can fill it in.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file is missing, unparsable,
    /// or lacks required settings.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            write_default(path)?;
            info!(path = %path.display(), "Wrote default configuration");
            return Err(Error::ConfigCreated(path.to_path_buf()));
        }

        debug!(path = %path.display(), "Loading configuration");
        let raw: RawConfig = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini))
            .build()?
            .try_deserialize()?;
        raw.resolve()
    }

    /// Parses configuration from INI text.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::load`], minus file handling.
    pub fn from_ini(text: &str) -> Result<Self> {
        let raw: RawConfig = Config::builder()
            .add_source(File::from_str(text, FileFormat::Ini))
            .build()?
            .try_deserialize()?;
        raw.resolve()
    }
}

/// Writes the template configuration to `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}

// Section names are matched in either case since INI files in the wild use
// both `[SMTP]` and `[smtp]`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "SMTP")]
    smtp: Option<RawSmtp>,
    #[serde(alias = "TEST", default)]
    test: RawTest,
    #[serde(alias = "COURSE", default)]
    course: RawCourse,
    #[serde(alias = "DISPATCH", default)]
    dispatch: RawDispatch,
}

#[derive(Debug, Default, Deserialize)]
struct RawSmtp {
    server: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    sender_email: Option<String>,
    use_tls: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTest {
    enable_test_mode: Option<bool>,
    recipient_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCourse {
    name: Option<String>,
    contacts_file: Option<String>,
    certificate_dir: Option<String>,
    signature: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDispatch {
    send_interval_secs: Option<u64>,
    certificate_extension: Option<String>,
    name_column: Option<String>,
    email_column: Option<String>,
}

impl RawConfig {
    fn resolve(self) -> Result<AppConfig> {
        let smtp = self
            .smtp
            .ok_or_else(|| Error::Config("missing [SMTP] section".into()))?;

        let run = RunConfig {
            host: required(smtp.server, "server")?,
            port: match smtp.port {
                Some(0) => return Err(Error::Config("[SMTP] port must not be 0".into())),
                Some(port) => port,
                None => return Err(missing("port")),
            },
            username: required(smtp.username, "username")?,
            password: required(smtp.password, "password")?,
            sender_email: required(smtp.sender_email, "sender_email")?,
            use_tls: smtp.use_tls.unwrap_or(false),
            test_mode: self.test.enable_test_mode.unwrap_or(false),
            test_recipient: non_empty(self.test.recipient_email),
        };
        run.effective_test_recipient()?;

        let course = CourseSettings {
            name: non_empty(self.course.name),
            contacts_file: non_empty(self.course.contacts_file).map(PathBuf::from),
            certificate_dir: non_empty(self.course.certificate_dir).map(PathBuf::from),
            signature: non_empty(self.course.signature),
        };

        let defaults = DispatchSettings::default();
        let dispatch = DispatchSettings {
            send_interval: self
                .dispatch
                .send_interval_secs
                .map_or(defaults.send_interval, Duration::from_secs),
            certificate_extension: non_empty(self.dispatch.certificate_extension)
                .map_or(defaults.certificate_extension, |ext| normalize_extension(&ext)),
            name_column: non_empty(self.dispatch.name_column).unwrap_or(defaults.name_column),
            email_column: non_empty(self.dispatch.email_column).unwrap_or(defaults.email_column),
        };

        Ok(AppConfig {
            run,
            course,
            dispatch,
        })
    }
}

fn missing(key: &str) -> Error {
    Error::Config(format!("missing [SMTP] {key}"))
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| missing(key))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL: &str = "\
[SMTP]
server = smtp.example.com
port = 587
username = office@example.com
password = secret
sender_email = office@example.com
use_tls = True

[TEST]
enable_test_mode = false
recipient_email =

[COURSE]
name = AI Studio
contacts_file = roster.csv
certificate_dir = certs
signature = 課程團隊 敬上

[DISPATCH]
send_interval_secs = 5
certificate_extension = pdf
";

    #[test]
    fn parses_all_sections() {
        let config = AppConfig::from_ini(FULL).unwrap();
        assert_eq!(config.run.host, "smtp.example.com");
        assert_eq!(config.run.port, 587);
        assert!(config.run.use_tls);
        assert_eq!(config.run.security(), Security::StartTls);
        assert!(!config.run.test_mode);
        assert_eq!(config.run.test_recipient, None);
        assert_eq!(config.course.name.as_deref(), Some("AI Studio"));
        assert_eq!(config.course.contacts_file, Some(PathBuf::from("roster.csv")));
        assert_eq!(config.course.signature.as_deref(), Some("課程團隊 敬上"));
        assert_eq!(config.dispatch.send_interval, Duration::from_secs(5));
        assert_eq!(config.dispatch.certificate_extension, ".pdf");
        assert_eq!(config.dispatch.name_column, DEFAULT_NAME_COLUMN);
    }

    #[test]
    fn optional_sections_default() {
        let config = AppConfig::from_ini(
            "[SMTP]\nserver = h\nport = 465\nusername = u\npassword = p\nsender_email = s@example.com\n",
        )
        .unwrap();
        assert!(!config.run.use_tls);
        assert_eq!(config.run.security(), Security::Tls);
        assert!(!config.run.test_mode);
        assert_eq!(config.course, CourseSettings::default());
        assert_eq!(config.dispatch, DispatchSettings::default());
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = AppConfig::from_ini("[SMTP]\nserver = h\nport = 465\nusername = u\npassword = p\n")
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("sender_email"));
    }

    #[test]
    fn test_mode_requires_recipient() {
        let err = AppConfig::from_ini(
            "[SMTP]\nserver = h\nport = 465\nusername = u\npassword = p\nsender_email = s@example.com\n\
             [TEST]\nenable_test_mode = true\nrecipient_email =\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn effective_recipient_only_in_test_mode() {
        let mut run = AppConfig::from_ini(FULL).unwrap().run;
        run.test_recipient = Some("qa@example.com".into());
        assert_eq!(run.effective_test_recipient().unwrap(), None);
        run.test_mode = true;
        assert_eq!(run.effective_test_recipient().unwrap(), Some("qa@example.com"));
    }

    #[test]
    fn missing_file_creates_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigCreated(_)));
        assert!(path.exists());

        // The template itself is a valid configuration.
        let config = AppConfig::load(&path).unwrap();
        assert!(config.run.test_mode);
        assert_eq!(config.dispatch, DispatchSettings::default());
    }

    #[test]
    fn debug_hides_password() {
        let config = AppConfig::from_ini(FULL).unwrap();
        let debug = format!("{:?}", config.run);
        assert!(!debug.contains("secret"));
    }
}
