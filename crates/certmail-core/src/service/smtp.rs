//! SMTP service for sending notices.
//!
//! Every message opens its own session: connect, EHLO, optional STARTTLS,
//! authenticate, one mail transaction, QUIT.

use super::Transport;
use crate::config::{RunConfig, Security};
use certmail_mime::{Attachment, MessageBuilder};
use certmail_smtp::connection::{DEFAULT_IO_TIMEOUT, connect, connect_tls};
use certmail_smtp::{Address, Client, Ready};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default time allowed for establishing a connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during SMTP operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Send failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// Invalid address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The attachment could not be read or the message could not be built.
    #[error("Attachment error: {0}")]
    Attachment(String),
}

/// A notice ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// File attached to the message.
    pub attachment: Option<PathBuf>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attachment: None,
        }
    }

    /// Attaches the file at `path`.
    #[must_use]
    pub fn attach(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }

    /// Builds the MIME message, reading the attachment from disk.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Attachment`] if the file cannot be read.
    pub fn to_mime(&self) -> Result<Vec<u8>, TransportError> {
        let mut builder = MessageBuilder::new()
            .from(self.from.as_str())
            .to(self.to.as_str())
            .subject(self.subject.as_str())
            .text_body(self.body.as_str());

        if let Some(path) = &self.attachment {
            let attachment = Attachment::from_file(path)
                .map_err(|e| TransportError::Attachment(e.to_string()))?;
            builder = builder.attach(attachment);
        }

        builder
            .build()
            .map(|message| message.to_bytes())
            .map_err(|e| TransportError::Attachment(e.to_string()))
    }
}

/// Server and credentials for outgoing mail.
#[derive(Clone)]
pub struct SmtpSettings {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
    /// Connect and TLS handshake timeout.
    pub timeout: Duration,
    /// Limit for each read or write once connected.
    pub io_timeout: Duration,
    /// Name announced in EHLO.
    pub client_hostname: String,
}

impl SmtpSettings {
    /// Takes the server settings of a run.
    #[must_use]
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            security: config.security(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: DEFAULT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            client_hostname: "localhost".to_string(),
        }
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("io_timeout", &self.io_timeout)
            .field("client_hostname", &self.client_hostname)
            .finish()
    }
}

/// [`Transport`] over SMTP.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    settings: SmtpSettings,
}

impl SmtpTransport {
    /// Creates a transport for the server named in `config`.
    #[must_use]
    pub fn new(config: &RunConfig) -> Self {
        Self::with_settings(SmtpSettings::from_run_config(config))
    }

    /// Creates a transport from explicit settings.
    #[must_use]
    pub const fn with_settings(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    #[must_use]
    pub const fn settings(&self) -> &SmtpSettings {
        &self.settings
    }
}

impl Transport for SmtpTransport {
    async fn send(&mut self, message: &OutgoingMessage) -> Result<(), TransportError> {
        send_email(&self.settings, message).await
    }
}

/// Send a message using the given SMTP settings.
///
/// # Errors
///
/// Returns an error if the message cannot be built, or if connection,
/// authentication, or sending fails.
pub async fn send_email(
    settings: &SmtpSettings,
    message: &OutgoingMessage,
) -> Result<(), TransportError> {
    let from =
        Address::new(&message.from).map_err(|e| TransportError::InvalidAddress(e.to_string()))?;
    let to = Address::new(&message.to).map_err(|e| TransportError::InvalidAddress(e.to_string()))?;

    // Build before connecting so an unreadable attachment costs no session.
    let data = message.to_mime()?;

    let client = open_session(settings).await?;

    let mut client = client
        .authenticate(&settings.username, &settings.password)
        .await
        .map_err(|e| TransportError::Authentication(e.to_string()))?;

    client
        .send_mail(&from, &[to], &data)
        .await
        .map_err(|e| {
            debug!(
                error = %e,
                permanent = e.is_permanent(),
                transient = e.is_transient(),
                "Mail transaction failed"
            );
            TransportError::Send(e.to_string())
        })?;

    // The message is already accepted at this point.
    if let Err(e) = client.quit().await {
        debug!(error = %e, "QUIT failed after delivery");
    }

    info!(to = %message.to, bytes = data.len(), "Message accepted by server");
    Ok(())
}

async fn open_session(settings: &SmtpSettings) -> Result<Client<Ready>, TransportError> {
    let session = match settings.security {
        Security::StartTls => starttls_session(settings).await,
        Security::Tls => match implicit_tls_session(settings).await {
            Ok(client) => Ok(client),
            Err(e) => {
                warn!(
                    host = %settings.host,
                    port = settings.port,
                    error = %e,
                    "Implicit TLS failed, retrying with STARTTLS"
                );
                starttls_session(settings).await
            }
        },
    };
    session.map_err(|e| TransportError::Connection(e.to_string()))
}

async fn implicit_tls_session(settings: &SmtpSettings) -> certmail_smtp::Result<Client<Ready>> {
    debug!(host = %settings.host, port = settings.port, "Connecting with implicit TLS");
    let stream = connect_tls(&settings.host, settings.port, settings.timeout)
        .await?
        .with_io_timeout(settings.io_timeout);
    Client::greet(stream)
        .await?
        .ehlo(&settings.client_hostname)
        .await
}

async fn starttls_session(settings: &SmtpSettings) -> certmail_smtp::Result<Client<Ready>> {
    debug!(host = %settings.host, port = settings.port, "Connecting with STARTTLS");
    let stream = connect(&settings.host, settings.port, settings.timeout)
        .await?
        .with_io_timeout(settings.io_timeout);
    Client::greet(stream)
        .await?
        .ehlo(&settings.client_hostname)
        .await?
        .starttls(&settings.host, &settings.client_hostname)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn run_config(use_tls: bool) -> RunConfig {
        RunConfig {
            host: "smtp.example.com".into(),
            port: 465,
            username: "office@example.com".into(),
            password: "secret".into(),
            sender_email: "office@example.com".into(),
            use_tls,
            test_mode: false,
            test_recipient: None,
        }
    }

    #[test]
    fn settings_follow_use_tls() {
        assert_eq!(SmtpTransport::new(&run_config(true)).settings().security, Security::StartTls);
        assert_eq!(SmtpTransport::new(&run_config(false)).settings().security, Security::Tls);
    }

    #[test]
    fn settings_debug_hides_password() {
        let debug = format!("{:?}", SmtpSettings::from_run_config(&run_config(false)));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn mime_carries_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cert-Alice.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let message = OutgoingMessage::new("a@example.com", "b@example.com", "Notice", "hi")
            .attach(&path);
        let wire = String::from_utf8(message.to_mime().unwrap()).unwrap();
        assert!(wire.contains("Content-Type: multipart/mixed;"));
        assert!(wire.contains("application/pdf"));
    }

    #[test]
    fn missing_attachment_is_an_attachment_error() {
        let message = OutgoingMessage::new("a@example.com", "b@example.com", "Notice", "hi")
            .attach("/nonexistent/cert-Alice.pdf");
        assert!(matches!(message.to_mime(), Err(TransportError::Attachment(_))));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let settings = SmtpSettings::from_run_config(&run_config(false));
        let message = OutgoingMessage::new("a@example.com", "not an address", "Notice", "hi");
        assert!(matches!(
            send_email(&settings, &message).await,
            Err(TransportError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn silent_server_fails_the_send() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let mut settings = SmtpSettings::from_run_config(&run_config(true));
        settings.host = "127.0.0.1".into();
        settings.port = port;
        settings.timeout = Duration::from_secs(1);
        settings.io_timeout = Duration::from_millis(200);
        let message = OutgoingMessage::new("a@example.com", "b@example.com", "Notice", "hi");

        let result = tokio::time::timeout(Duration::from_secs(10), send_email(&settings, &message))
            .await
            .unwrap();
        match result {
            Err(TransportError::Connection(reason)) => assert!(reason.contains("timed out")),
            other => panic!("expected a connection timeout, got {other:?}"),
        }
    }
}
