//! Type-state SMTP client.
//!
//! ```text
//! Connected ── ehlo() ──→ Ready ── starttls() ──→ Ready
//!                           │
//!                           └── authenticate() ──→ Authenticated ── send_mail() ─┐
//!                                                        ↑_______________________┘
//! ```

use super::{ServerInfo, SmtpStream};
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::parser::{assemble, parse_line};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Greeting received, EHLO not sent yet.
#[derive(Debug)]
pub struct Connected;

/// EHLO accepted; the session may be upgraded or authenticated.
#[derive(Debug)]
pub struct Ready;

/// Logged in; mail transactions may run.
#[derive(Debug)]
pub struct Authenticated;

/// SMTP client whose state is tracked in the type.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<S> Client<S> {
    /// Returns the server information gathered so far.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns true once the session is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        if cmd.is_sensitive() {
            trace!("C: <credentials>");
        } else {
            trace!("C: {}", String::from_utf8_lossy(&cmd.serialize()).trim_end());
        }
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    /// Sends a command and requires the given reply code.
    async fn expect(&mut self, cmd: &Command, code: ReplyCode) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        if reply.code != code {
            return Err(Error::rejected(reply.code.as_u16(), reply.text()));
        }
        Ok(reply)
    }

    /// Sends a command and requires any 2xx reply.
    async fn expect_success(&mut self, cmd: &Command) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        if !reply.is_success() {
            return Err(Error::rejected(reply.code.as_u16(), reply.text()));
        }
        Ok(reply)
    }

    async fn hello(&mut self, client_hostname: &str) -> Result<()> {
        let reply = self
            .expect_success(&Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?;
        // First line is the server's greeting text, the rest are extensions
        self.server_info.extensions = reply
            .lines
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();
        debug!(
            server = %self.server_info.hostname,
            extensions = self.server_info.extensions.len(),
            "EHLO accepted"
        );
        Ok(())
    }

    /// Sends QUIT and drops the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the server answers with anything other than
    /// 221 or another 2xx code.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::rejected(reply.code.as_u16(), reply.text()));
        }
        Ok(())
    }
}

impl Client<Connected> {
    /// Reads the 220 greeting from a freshly opened stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read or is not 2xx.
    pub async fn greet(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if !greeting.is_success() {
            return Err(Error::rejected(greeting.code.as_u16(), greeting.text()));
        }

        let hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: Vec::new(),
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if EHLO is rejected.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Client<Ready>> {
        self.hello(client_hostname).await?;
        Ok(self.into_state())
    }
}

impl Client<Ready> {
    /// Upgrades the session with STARTTLS and repeats EHLO over TLS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] when the server does not offer
    /// STARTTLS, or an error from the handshake or the second EHLO.
    pub async fn starttls(mut self, tls_hostname: &str, client_hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.expect(&Command::StartTls, ReplyCode::SERVICE_READY)
            .await?;

        self.stream = self.stream.upgrade_to_tls(tls_hostname).await?;
        // RFC 3207: capabilities must be discarded and re-queried
        self.hello(client_hostname).await?;
        Ok(self)
    }

    /// Logs in with the mechanism chosen by [`ServerInfo::preferred_auth`].
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn authenticate(self, username: &str, password: &str) -> Result<Client<Authenticated>> {
        match self.server_info.preferred_auth() {
            AuthMechanism::Plain => self.auth_plain(username, password).await,
            AuthMechanism::Login => self.auth_login(username, password).await,
        }
    }

    /// AUTH PLAIN with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers 235.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let token = STANDARD.encode(format!("\0{username}\0{password}"));
        self.expect(
            &Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(token),
            },
            ReplyCode::AUTH_SUCCEEDED,
        )
        .await?;
        Ok(self.into_state())
    }

    /// AUTH LOGIN: username and password each answer a 334 challenge.
    ///
    /// # Errors
    ///
    /// Returns an error if any step gets an unexpected reply.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        self.expect(
            &Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            },
            ReplyCode::AUTH_CONTINUE,
        )
        .await?;
        self.expect(
            &Command::AuthResponse(STANDARD.encode(username)),
            ReplyCode::AUTH_CONTINUE,
        )
        .await?;
        self.expect(
            &Command::AuthResponse(STANDARD.encode(password)),
            ReplyCode::AUTH_SUCCEEDED,
        )
        .await?;
        Ok(self.into_state())
    }
}

impl Client<Authenticated> {
    /// Runs one mail transaction: MAIL FROM, RCPT TO for each recipient,
    /// DATA, and the message itself.
    ///
    /// The session stays authenticated afterwards. When the server rejects
    /// a step after MAIL FROM, the transaction is reset so the session can
    /// be reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] without recipients, or the rejection that
    /// aborted the transaction.
    pub async fn send_mail(&mut self, from: &Address, to: &[Address], message: &[u8]) -> Result<()> {
        if to.is_empty() {
            return Err(Error::Protocol("no recipients".into()));
        }
        if let Some(limit) = self.server_info.max_message_size().filter(|&l| l > 0) {
            if message.len() > limit {
                return Err(Error::rejected(
                    552,
                    format!("message is {} bytes, server limit is {limit}", message.len()),
                ));
            }
        }

        self.expect_success(&Command::MailFrom { from: from.clone() })
            .await?;

        if let Err(err) = self.transmit(to, message).await {
            if !matches!(err, Error::Io(_) | Error::ConnectionClosed) {
                if let Err(e) = self.send_command(&Command::Rset).await {
                    debug!(error = %e, "RSET failed after rejected transaction");
                }
            }
            return Err(err);
        }
        Ok(())
    }

    async fn transmit(&mut self, to: &[Address], message: &[u8]) -> Result<()> {
        for rcpt in to {
            self.expect_success(&Command::RcptTo { to: rcpt.clone() })
                .await?;
        }
        self.expect(&Command::Data, ReplyCode::START_DATA).await?;

        self.stream.write_all(&encode_data(message)).await?;
        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(Error::rejected(reply.code.as_u16(), reply.text()));
        }
        debug!(recipients = to.len(), bytes = message.len(), "message accepted");
        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let raw = stream.read_line().await?;
        trace!("S: {raw}");
        let line = parse_line(&raw)?;
        let last = line.last;
        lines.push(line);
        if last {
            break;
        }
    }
    assemble(lines)
}
