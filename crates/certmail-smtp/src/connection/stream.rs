//! Socket layer: plain TCP or TLS, line-buffered for reading.
//!
//! Every read and write is bounded by the stream's I/O timeout, so a server
//! that accepts the connection and then goes quiet surfaces as
//! [`Error::Timeout`] instead of stalling the caller.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// Default limit for a single read or write.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
enum Inner {
    Tcp(BufReader<TcpStream>),
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub struct SmtpStream {
    inner: Inner,
    io_timeout: Duration,
}

impl SmtpStream {
    const fn new(inner: Inner) -> Self {
        Self {
            inner,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Sets the limit for each read and write.
    #[must_use]
    pub const fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Returns the limit for each read and write.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Reads one line, without its line ending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no line arrives within the I/O timeout,
    /// [`Error::ConnectionClosed`] at end of stream, or the I/O error from
    /// the socket.
    pub async fn read_line(&mut self) -> Result<String> {
        let limit = self.io_timeout;
        let mut line = String::new();
        let read = async {
            match &mut self.inner {
                Inner::Tcp(reader) => reader.read_line(&mut line).await,
                Inner::Tls(reader) => reader.read_line(&mut line).await,
            }
        };
        let n = tokio::time::timeout(limit, read).await.map_err(|_| {
            Error::Timeout(format!("server reply ({}s without data)", limit.as_secs()))
        })??;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        line.truncate(line.trim_end_matches(['\r', '\n']).len());
        Ok(line)
    }

    /// Writes and flushes `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the write does not finish within the
    /// I/O timeout, or the I/O error from the socket.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let limit = self.io_timeout;
        let write = async {
            match &mut self.inner {
                Inner::Tcp(reader) => {
                    reader.get_mut().write_all(data).await?;
                    reader.get_mut().flush().await
                }
                Inner::Tls(reader) => {
                    reader.get_mut().write_all(data).await?;
                    reader.get_mut().flush().await
                }
            }
        };
        tokio::time::timeout(limit, write)
            .await
            .map_err(|_| Error::Timeout(format!("write to server ({}s)", limit.as_secs())))??;
        Ok(())
    }

    /// Returns true once the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self.inner, Inner::Tls(_))
    }

    /// Runs the TLS handshake over the existing TCP connection (STARTTLS).
    ///
    /// The handshake is bounded by the I/O timeout, which carries over to
    /// the upgraded stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted, the hostname is
    /// not a valid server name, or the handshake fails or times out.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let io_timeout = self.io_timeout;
        let tcp = match self.inner {
            Inner::Tcp(reader) => reader.into_inner(),
            Inner::Tls(_) => return Err(Error::Protocol("stream already uses TLS".into())),
        };
        let tls = tokio::time::timeout(io_timeout, handshake(hostname, tcp))
            .await
            .map_err(|_| Error::Timeout(format!("{hostname} (STARTTLS handshake)")))??;
        Ok(Self::new(Inner::Tls(Box::new(BufReader::new(tls)))).with_io_timeout(io_timeout))
    }
}

/// Opens a plain TCP connection, giving up after `timeout`.
///
/// The returned stream uses [`DEFAULT_IO_TIMEOUT`] for reads and writes.
///
/// # Errors
///
/// Returns [`Error::Timeout`] or the connect error.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let tcp = open_tcp(hostname, port, timeout).await?;
    Ok(SmtpStream::new(Inner::Tcp(BufReader::new(tcp))))
}

/// Opens a connection and immediately negotiates TLS (SMTPS, usually 465).
///
/// # Errors
///
/// Returns [`Error::Timeout`], the connect error, or the handshake error.
pub async fn connect_tls(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let tcp = open_tcp(hostname, port, timeout).await?;
    let tls = tokio::time::timeout(timeout, handshake(hostname, tcp))
        .await
        .map_err(|_| Error::Timeout(format!("{hostname}:{port} (TLS handshake)")))??;
    Ok(SmtpStream::new(Inner::Tls(Box::new(BufReader::new(tls)))))
}

async fn open_tcp(hostname: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{hostname}:{port}");
    tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout(addr.clone()))?
        .map_err(Error::from)
}

async fn handshake(
    hostname: &str,
    tcp: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("invalid TLS server name: {hostname}")))?;
    Ok(tls_connector().connect(server_name, tcp).await?)
}

/// Connector trusting the bundled Mozilla root set.
fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
